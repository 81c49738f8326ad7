mod helpers;

use helpers::{ScriptedForwarder, ScriptedResolver};
use oxidns_application::ports::TransportKind;
use oxidns_application::use_cases::HandleQueryUseCase;
use oxidns_domain::{
    DnsError, Message, Question, Rcode, RecordClass, RecordType, ResourceRecord,
};
use std::net::Ipv4Addr;
use std::sync::Arc;

fn client_query(name: &str, rd: bool) -> Message {
    Message::query(name, RecordType::A, RecordClass::In, rd).unwrap()
}

fn answered(query: &Message, ip: Ipv4Addr) -> Message {
    let mut response = query.clone();
    response.header.qr = true;
    response
        .answers
        .push(ResourceRecord::a(query.questions[0].name.clone(), 300, ip));
    response.header.set_ancount(1).unwrap();
    response
}

#[tokio::test]
async fn test_rd_query_goes_to_resolver_when_recursion_enabled() {
    let query = client_query("example.com", true);
    let response = answered(&query, Ipv4Addr::new(1, 2, 3, 4));

    let resolver = Arc::new(ScriptedResolver::new(Ok(response.clone())));
    let forwarder = Arc::new(ScriptedForwarder::new(Err(DnsError::ResolutionExhausted)));
    let use_case = HandleQueryUseCase::new(resolver.clone(), forwarder.clone(), true);

    let result = use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap();
    assert_eq!(result, response);
    assert_eq!(resolver.calls.lock().unwrap().len(), 1);
    assert!(forwarder.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_rd_query_goes_to_forwarder() {
    let query = client_query("example.com", false);
    let response = answered(&query, Ipv4Addr::new(5, 6, 7, 8));

    let resolver = Arc::new(ScriptedResolver::new(Err(DnsError::ResolutionExhausted)));
    let forwarder = Arc::new(ScriptedForwarder::new(Ok(response.clone())));
    let use_case = HandleQueryUseCase::new(resolver.clone(), forwarder.clone(), true);

    let result = use_case
        .execute(query, TransportKind::Stream)
        .await
        .unwrap();
    assert_eq!(result, response);
    assert!(resolver.calls.lock().unwrap().is_empty());

    let calls = forwarder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, TransportKind::Stream);
}

#[tokio::test]
async fn test_recursion_disabled_forwards_even_with_rd() {
    let query = client_query("example.com", true);
    let response = answered(&query, Ipv4Addr::new(9, 9, 9, 9));

    let resolver = Arc::new(ScriptedResolver::new(Err(DnsError::ResolutionExhausted)));
    let forwarder = Arc::new(ScriptedForwarder::new(Ok(response)));
    let use_case = HandleQueryUseCase::new(resolver.clone(), forwarder.clone(), false);

    use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap();
    assert!(resolver.calls.lock().unwrap().is_empty());
    assert_eq!(forwarder.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_forward_path_resets_qr_flag() {
    let mut query = client_query("example.com", false);
    query.header.qr = true;
    let response = answered(&query, Ipv4Addr::new(1, 1, 1, 1));

    let resolver = Arc::new(ScriptedResolver::new(Err(DnsError::ResolutionExhausted)));
    let forwarder = Arc::new(ScriptedForwarder::new(Ok(response)));
    let use_case = HandleQueryUseCase::new(resolver, forwarder.clone(), true);

    use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap();

    let calls = forwarder.calls.lock().unwrap();
    assert!(!calls[0].0.header.qr);
}

#[tokio::test]
async fn test_query_without_questions_is_rejected() {
    let query = Message::default();

    let resolver = Arc::new(ScriptedResolver::new(Err(DnsError::ResolutionExhausted)));
    let forwarder = Arc::new(ScriptedForwarder::new(Err(DnsError::ResolutionExhausted)));
    let use_case = HandleQueryUseCase::new(resolver, forwarder, true);

    let err = use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap_err();
    assert!(matches!(err, DnsError::Protocol(_)));
}

#[tokio::test]
async fn test_multi_question_query_collapses_to_first() {
    let mut query = client_query("example.com", true);
    query
        .add_question(Question::new("other.com", RecordType::A, RecordClass::In))
        .unwrap();
    let response = answered(&client_query("example.com", true), Ipv4Addr::new(1, 2, 3, 4));

    let resolver = Arc::new(ScriptedResolver::new(Ok(response)));
    let forwarder = Arc::new(ScriptedForwarder::new(Err(DnsError::ResolutionExhausted)));
    let use_case = HandleQueryUseCase::new(resolver.clone(), forwarder, true);

    use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap();

    let calls = resolver.calls.lock().unwrap();
    assert_eq!(calls[0].questions.len(), 1);
    assert_eq!(calls[0].header.qdcount(), 1);
    assert_eq!(calls[0].questions[0].name, "example.com");
}

#[tokio::test]
async fn test_resolver_error_rcode_is_rejected() {
    let query = client_query("example.com", true);
    let mut response = answered(&query, Ipv4Addr::new(1, 2, 3, 4));
    response.header.rcode = Rcode::ServerFailure;

    let resolver = Arc::new(ScriptedResolver::new(Ok(response)));
    let forwarder = Arc::new(ScriptedForwarder::new(Err(DnsError::ResolutionExhausted)));
    let use_case = HandleQueryUseCase::new(resolver, forwarder, true);

    let err = use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap_err();
    assert!(matches!(err, DnsError::Protocol(_)));
}

#[tokio::test]
async fn test_resolver_failure_surfaces_to_caller() {
    let query = client_query("example.com", true);

    let resolver = Arc::new(ScriptedResolver::new(Err(DnsError::ResolutionExhausted)));
    let forwarder = Arc::new(ScriptedForwarder::new(Err(DnsError::ResolutionExhausted)));
    let use_case = HandleQueryUseCase::new(resolver, forwarder, true);

    let err = use_case
        .execute(query, TransportKind::Datagram)
        .await
        .unwrap_err();
    assert_eq!(err, DnsError::ResolutionExhausted);
}
