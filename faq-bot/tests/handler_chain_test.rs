//! Integration tests for [`faq_bot::HandlerChain`].
//!
//! Covers: `before` stopping the chain, Stop and Reply ending the handle phase, Continue
//! falling through, `after` seeing the final response in reverse order, and handler errors.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::text_message;
use faq_bot::{Handler, HandlerChain, HandlerError, HandlerResponse, Message};

type Trace = Arc<Mutex<Vec<String>>>;

/// Records every phase and answers `handle` with a fixed response.
struct Scripted {
    name: &'static str,
    allow: bool,
    response: HandlerResponse,
    trace: Trace,
}

impl Scripted {
    fn new(name: &'static str, response: HandlerResponse, trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            name,
            allow: true,
            response,
            trace: trace.clone(),
        })
    }

    fn blocking(name: &'static str, trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            name,
            allow: false,
            response: HandlerResponse::Continue,
            trace: trace.clone(),
        })
    }

    fn log(&self, phase: &str) {
        self.trace
            .lock()
            .unwrap()
            .push(format!("{}_{}", phase, self.name));
    }
}

#[async_trait]
impl Handler for Scripted {
    async fn before(&self, _message: &Message) -> faq_bot::Result<bool> {
        self.log("before");
        Ok(self.allow)
    }

    async fn handle(&self, _message: &Message) -> faq_bot::Result<HandlerResponse> {
        self.log("handle");
        Ok(self.response.clone())
    }

    async fn after(&self, _message: &Message, response: &HandlerResponse) -> faq_bot::Result<()> {
        self.log(&format!("after({:?})", response));
        Ok(())
    }
}

fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

/// **Test: Continue falls through; Reply stops; `after` runs in reverse with the reply.**
#[tokio::test]
async fn test_reply_stops_and_reaches_after() {
    let t = trace();
    let chain = HandlerChain::new()
        .add_handler(Scripted::new("log", HandlerResponse::Continue, &t))
        .add_handler(Scripted::new("faq", HandlerResponse::Reply("9 to 5".into()), &t))
        .add_handler(Scripted::new("ai", HandlerResponse::Continue, &t));

    let result = chain.handle(&text_message(1, "1", "hours")).await.unwrap();

    assert_eq!(result, HandlerResponse::Reply("9 to 5".to_string()));
    let reply = r#"Reply("9 to 5")"#;
    assert_eq!(
        *t.lock().unwrap(),
        vec![
            "before_log".to_string(),
            "before_faq".to_string(),
            "before_ai".to_string(),
            "handle_log".to_string(),
            "handle_faq".to_string(),
            format!("after({})_ai", reply),
            format!("after({})_faq", reply),
            format!("after({})_log", reply),
        ]
    );
}

/// **Test: `before` returning false stops the chain; no handle, no after.**
#[tokio::test]
async fn test_before_false_stops_chain() {
    let t = trace();
    let chain = HandlerChain::new()
        .add_handler(Scripted::blocking("gate", &t))
        .add_handler(Scripted::new("ai", HandlerResponse::Reply("x".into()), &t));

    let result = chain.handle(&text_message(1, "1", "hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(*t.lock().unwrap(), vec!["before_gate".to_string()]);
}

/// **Test: Stop ends the handle phase; Ignore does not.**
#[tokio::test]
async fn test_stop_ends_ignore_continues() {
    let t = trace();
    let chain = HandlerChain::new()
        .add_handler(Scripted::new("a", HandlerResponse::Ignore, &t))
        .add_handler(Scripted::new("b", HandlerResponse::Stop, &t))
        .add_handler(Scripted::new("c", HandlerResponse::Reply("x".into()), &t));

    let result = chain.handle(&text_message(1, "1", "hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    let handled: Vec<String> = t
        .lock()
        .unwrap()
        .iter()
        .filter(|s| s.starts_with("handle_"))
        .cloned()
        .collect();
    assert_eq!(handled, vec!["handle_a", "handle_b"]);
}

/// **Test: an empty chain answers Continue.**
#[tokio::test]
async fn test_empty_chain_continues() {
    let chain = HandlerChain::new();
    assert!(chain.is_empty());
    let result = chain.handle(&text_message(1, "1", "hi")).await.unwrap();
    assert_eq!(result, HandlerResponse::Continue);
}

/// **Test: a handler error aborts the chain and is returned.**
#[tokio::test]
async fn test_handler_error_propagates() {
    struct Failing;

    #[async_trait]
    impl Handler for Failing {
        async fn handle(&self, _message: &Message) -> faq_bot::Result<HandlerResponse> {
            Err(HandlerError::InvalidCommand("boom".into()).into())
        }
    }

    let t = trace();
    let chain = HandlerChain::new()
        .add_handler(Arc::new(Failing))
        .add_handler(Scripted::new("after_fail", HandlerResponse::Continue, &t));

    let err = chain.handle(&text_message(1, "1", "hi")).await.unwrap_err();
    assert!(err.to_string().contains("boom"));
    assert!(!t.lock().unwrap().iter().any(|s| s.starts_with("handle_")));
    assert_eq!(chain.len(), 2);
}
