//! Request dispatch: pick one action, run it, always produce a result.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::matcher::tokenize;
use crate::{
    DispatchError, PlaceholderResponder, Responder, ResponderError, ToolDescriptor, ToolError,
    ToolRegistry,
};

const EMPTY_REQUEST_REPLY: &str =
    "Invalid request: the message was empty. Please send some text.";
const RESPONDER_FAILED_REPLY: &str =
    "Sorry, I couldn't come up with an answer right now. Please try again.";

/// An incoming user utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub text: String,
}

impl DispatchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for DispatchRequest {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// The single reply produced for a request.
///
/// Callers must check `succeeded` to tell real answers from failure
/// fallbacks.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub reply_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_tool: Option<String>,
    pub succeeded: bool,
    /// The underlying failure, for the caller's logs. Never shown to users.
    #[serde(skip)]
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    fn answered(reply_text: String, used_tool: Option<&str>) -> Self {
        Self {
            reply_text,
            used_tool: used_tool.map(str::to_string),
            succeeded: true,
            error: None,
        }
    }

    fn failed(reply_text: String, used_tool: Option<&str>, error: DispatchError) -> Self {
        Self {
            reply_text,
            used_tool: used_tool.map(str::to_string),
            succeeded: false,
            error: Some(error),
        }
    }

    /// Which path produced this result, as logged.
    pub fn path(&self) -> DispatchPath {
        match (&self.used_tool, &self.error) {
            (Some(_), _) => DispatchPath::Tool,
            (None, Some(DispatchError::InvalidRequest(_))) => DispatchPath::Rejected,
            (None, _) => DispatchPath::Direct,
        }
    }
}

/// How a dispatch was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPath {
    Rejected,
    Direct,
    Tool,
}

impl DispatchPath {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchPath::Rejected => "rejected",
            DispatchPath::Direct => "direct",
            DispatchPath::Tool => "tool",
        }
    }
}

/// Why a request is answered without a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectReason {
    EmptyRegistry,
    NoMatch,
}

/// The action chosen for a request.
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Direct(DirectReason),
    Tool {
        tool: &'a ToolDescriptor,
        /// Text handed to the tool.
        input: String,
    },
}

impl Selection<'_> {
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Selection::Direct(_) => None,
            Selection::Tool { tool, .. } => Some(tool.name()),
        }
    }
}

/// Choose an action for `text`. Pure and deterministic for a given registry.
///
/// The first tool in registration order whose vocabulary matches wins. Its
/// input is the text after the earliest matching trigger, or the whole text
/// when nothing follows the trigger.
pub fn select<'a>(text: &str, registry: &'a ToolRegistry) -> Selection<'a> {
    if registry.is_empty() {
        return Selection::Direct(DirectReason::EmptyRegistry);
    }

    let text = text.trim();
    let tokens = tokenize(text);

    registry
        .registered()
        .iter()
        .find_map(|registered| {
            registered
                .vocabulary
                .earliest_match(&tokens)
                .map(|hit| (&registered.descriptor, hit))
        })
        .map_or(Selection::Direct(DirectReason::NoMatch), |(tool, hit)| {
            let rest = text[hit.end..].trim();
            let input = if rest.is_empty() { text } else { rest };
            Selection::Tool {
                tool,
                input: input.to_string(),
            }
        })
}

/// Routes requests to tools or a direct-answer responder.
#[derive(Clone)]
pub struct Dispatcher {
    responder: Arc<dyn Responder>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(PlaceholderResponder)
    }
}

impl Dispatcher {
    pub fn new(responder: impl Responder + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
        }
    }

    /// Dispatch one request.
    ///
    /// Never returns an error. Panics in tools and the responder are caught,
    /// so every path ends in exactly one result and one log event.
    pub fn dispatch(&self, request: &DispatchRequest, registry: &ToolRegistry) -> DispatchResult {
        let result = self.resolve(request, registry);
        record(&result);
        result
    }

    fn resolve(&self, request: &DispatchRequest, registry: &ToolRegistry) -> DispatchResult {
        if request.text.trim().is_empty() {
            return DispatchResult::failed(
                EMPTY_REQUEST_REPLY.to_string(),
                None,
                DispatchError::InvalidRequest("request text is empty".into()),
            );
        }

        match select(&request.text, registry) {
            Selection::Direct(_) => match self.respond(request, registry) {
                Ok(reply) => DispatchResult::answered(reply, None),
                Err(e) => DispatchResult::failed(RESPONDER_FAILED_REPLY.to_string(), None, e.into()),
            },
            Selection::Tool { tool, input } => invoke(tool, &input),
        }
    }

    fn respond(
        &self,
        request: &DispatchRequest,
        registry: &ToolRegistry,
    ) -> Result<String, ResponderError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.responder.respond(request, registry)))
            .unwrap_or_else(|payload| Err(ResponderError::Panicked(panic_message(payload.as_ref()))))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Dispatch with the default [`PlaceholderResponder`].
pub fn dispatch(request: &DispatchRequest, registry: &ToolRegistry) -> DispatchResult {
    Dispatcher::default().dispatch(request, registry)
}

fn invoke(tool: &ToolDescriptor, input: &str) -> DispatchResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| tool.invoke(input)))
        .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(reply) => DispatchResult::answered(reply, Some(tool.name())),
        Err(source) => DispatchResult::failed(
            source.summary(tool.name()),
            Some(tool.name()),
            DispatchError::ToolExecution {
                tool: tool.name().to_string(),
                source,
            },
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn record(result: &DispatchResult) {
    let path = result.path().as_str();
    let tool = result.used_tool.as_deref();
    let succeeded = result.succeeded;

    match &result.error {
        None => tracing::info!(target: "dispatch", path, tool, succeeded, "dispatch completed"),
        Some(error) => tracing::warn!(
            target: "dispatch",
            path,
            tool,
            succeeded,
            error = %error,
            "dispatch completed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn ok_tool(name: &str, tags: &[&str]) -> ToolDescriptor {
        let label = name.to_string();
        ToolDescriptor::new(
            name,
            "",
            move |input: &str| -> Result<String, ToolError> { Ok(format!("{label}: {input}")) },
        )
        .with_tags(tags.iter().copied())
    }

    /// Integer-only `a<op>b` arithmetic, enough to drive the calculator scenarios.
    fn calculator() -> ToolDescriptor {
        ToolDescriptor::new(
            "calculator",
            "Evaluates arithmetic",
            |input: &str| -> Result<String, ToolError> {
                let op = input
                    .find(['+', '-', '*', '/'])
                    .ok_or_else(|| ToolError::InvalidInput(format!("no operator in {input:?}")))?;
                let parse = |s: &str| {
                    s.trim()
                        .parse::<i64>()
                        .map_err(|e| ToolError::InvalidInput(e.to_string()))
                };
                let (a, b) = (parse(&input[..op])?, parse(&input[op + 1..])?);
                let value = match &input[op..op + 1] {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    _ => a
                        .checked_div(b)
                        .ok_or_else(|| ToolError::Execution("division by zero".into()))?,
                };
                Ok(value.to_string())
            },
        )
        .with_tags(["calculate", "math"])
    }

    struct FailingResponder;

    impl Responder for FailingResponder {
        fn respond(&self, _: &DispatchRequest, _: &ToolRegistry) -> Result<String, ResponderError> {
            Err(ResponderError::Api("503 upstream secret-host-01".into()))
        }
    }

    #[test]
    fn empty_registry_answers_directly() {
        let result = dispatch(&"hello".into(), &ToolRegistry::new());

        assert!(result.succeeded);
        assert_eq!(result.used_tool, None);
        assert_eq!(result.path(), DispatchPath::Direct);
        assert!(result.reply_text.contains("hello"));
    }

    #[test]
    fn single_matching_tool_is_invoked() {
        let registry = ToolRegistry::from_tools([calculator()]).unwrap();
        let result = dispatch(&"calculate 2+2".into(), &registry);

        assert!(result.succeeded);
        assert_eq!(result.used_tool.as_deref(), Some("calculator"));
        assert!(result.reply_text.contains('4'));
        assert!(result.error.is_none());
    }

    #[test]
    fn tool_failure_is_sanitized() {
        let registry = ToolRegistry::from_tools([calculator()]).unwrap();
        let result = dispatch(&"calculate 1/0".into(), &registry);

        assert!(!result.succeeded);
        assert_eq!(result.used_tool.as_deref(), Some("calculator"));
        assert!(!result.reply_text.contains("division"));
        assert!(!result.reply_text.contains("zero"));
        assert_eq!(
            result.error,
            Some(DispatchError::ToolExecution {
                tool: "calculator".into(),
                source: ToolError::Execution("division by zero".into()),
            })
        );
    }

    #[test]
    fn first_registered_tool_wins_ties() {
        let registry = ToolRegistry::from_tools([
            ok_tool("web_search", &["search"]),
            ok_tool("doc_search", &["search"]),
        ])
        .unwrap();

        let result = dispatch(&"search for cats".into(), &registry);
        assert_eq!(result.used_tool.as_deref(), Some("web_search"));
        assert_eq!(result.reply_text, "web_search: for cats");
    }

    #[test]
    fn whitespace_request_is_rejected() {
        let registry = ToolRegistry::from_tools([ok_tool("echo", &["echo"])]).unwrap();
        let result = dispatch(&" \t\n ".into(), &registry);

        assert!(!result.succeeded);
        assert_eq!(result.used_tool, None);
        assert_eq!(result.path(), DispatchPath::Rejected);
        assert!(result.reply_text.starts_with("Invalid request"));
        assert!(matches!(result.error, Some(DispatchError::InvalidRequest(_))));
    }

    #[test]
    fn empty_request_is_rejected_even_without_tools() {
        let result = dispatch(&"".into(), &ToolRegistry::new());
        assert!(!result.succeeded);
        assert_eq!(result.path(), DispatchPath::Rejected);
    }

    #[test]
    fn no_match_answers_directly() {
        let registry = ToolRegistry::from_tools([calculator()]).unwrap();
        let result = dispatch(&"tell me a joke".into(), &registry);

        assert!(result.succeeded);
        assert_eq!(result.used_tool, None);
        assert!(result.reply_text.contains("calculator"));
    }

    #[test]
    fn panicking_tool_yields_failed_result() {
        let registry = ToolRegistry::from_tools([ToolDescriptor::new(
            "fragile",
            "",
            |_: &str| -> Result<String, ToolError> { panic!("internal invariant broken") },
        )
        .with_tags(["fragile"])])
        .unwrap();

        let result = dispatch(&"fragile thing".into(), &registry);
        assert!(!result.succeeded);
        assert_eq!(result.used_tool.as_deref(), Some("fragile"));
        assert!(!result.reply_text.contains("invariant"));
        assert_eq!(
            result.error,
            Some(DispatchError::ToolExecution {
                tool: "fragile".into(),
                source: ToolError::Panicked("internal invariant broken".into()),
            })
        );
    }

    #[test]
    fn responder_failure_is_reported_not_raised() {
        let dispatcher = Dispatcher::new(FailingResponder);
        let result = dispatcher.dispatch(&"hi".into(), &ToolRegistry::new());

        assert!(!result.succeeded);
        assert_eq!(result.used_tool, None);
        assert_eq!(result.reply_text, RESPONDER_FAILED_REPLY);
        assert!(!result.reply_text.contains("secret-host"));
    }

    struct PanickingResponder;

    impl Responder for PanickingResponder {
        fn respond(&self, _: &DispatchRequest, _: &ToolRegistry) -> Result<String, ResponderError> {
            panic!("responder state corrupted")
        }
    }

    #[test]
    fn responder_panic_is_contained() {
        let dispatcher = Dispatcher::new(PanickingResponder);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.dispatch(&"hello".into(), &ToolRegistry::new())
        }));

        let result = outcome.expect("panic escaped the dispatcher");
        assert!(!result.succeeded);
        assert_eq!(result.used_tool, None);
        assert_eq!(result.path(), DispatchPath::Direct);
        assert_eq!(result.reply_text, RESPONDER_FAILED_REPLY);
        assert_eq!(
            result.error,
            Some(DispatchError::Responder(ResponderError::Panicked(
                "responder state corrupted".into()
            )))
        );
    }

    #[test]
    fn tool_input_is_text_after_trigger() {
        let registry = ToolRegistry::from_tools([ok_tool("echo", &["echo"])]).unwrap();

        assert_eq!(
            dispatch(&"please ECHO   this back ".into(), &registry).reply_text,
            "echo: this back"
        );
        // Nothing after the trigger: the whole request is passed through.
        assert_eq!(
            dispatch(&"can you echo".into(), &registry).reply_text,
            "echo: can you echo"
        );
    }

    #[test]
    fn selection_is_stable_across_calls() {
        let registry = ToolRegistry::from_tools([
            ok_tool("translator", &["translate"]),
            ok_tool("search", &["search", "find"]),
            ok_tool("calculator", &["math"]),
        ])
        .unwrap();

        for text in ["find and translate math", "search", "nothing here", "MATH homework"] {
            let first = select(text, &registry).tool_name().map(str::to_string);
            for _ in 0..5 {
                assert_eq!(select(text, &registry).tool_name(), first.as_deref());
                assert_eq!(dispatch(&text.into(), &registry).used_tool, first);
            }
        }
        assert_eq!(
            select("find and translate math", &registry).tool_name(),
            Some("translator")
        );
    }

    #[test]
    fn select_reports_direct_reasons() {
        assert!(matches!(
            select("hi", &ToolRegistry::new()),
            Selection::Direct(DirectReason::EmptyRegistry)
        ));
        let registry = ToolRegistry::from_tools([ok_tool("echo", &["echo"])]).unwrap();
        assert!(matches!(
            select("hi", &registry),
            Selection::Direct(DirectReason::NoMatch)
        ));
    }

    #[test]
    fn only_the_selected_tool_runs() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let counting = |name: &str, tag: &str| {
            ToolDescriptor::new(name, "", |_: &str| -> Result<String, ToolError> {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok("done".into())
            })
            .with_tags([tag.to_string()])
        };
        let registry =
            ToolRegistry::from_tools([counting("one", "go"), counting("two", "go")]).unwrap();

        let result = dispatch(&"go".into(), &registry);
        assert_eq!(result.used_tool.as_deref(), Some("one"));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_dispatch_shares_registry() {
        let registry = Arc::new(ToolRegistry::from_tools([calculator()]).unwrap());
        let dispatcher = Dispatcher::default();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let dispatcher = dispatcher.clone();
                std::thread::spawn(move || {
                    let request = DispatchRequest::new(format!("calculate {i}*2"));
                    dispatcher.dispatch(&request, &registry)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert!(result.succeeded);
            assert_eq!(result.reply_text, (i * 2).to_string());
        }
    }

    #[derive(Debug)]
    struct Event {
        level: tracing::Level,
        fields: HashMap<String, String>,
    }

    /// Collects `dispatch` events with their fields.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Event>>>);

    struct Fields<'a>(&'a mut HashMap<String, String>);

    impl Visit for Fields<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &tracing::Event<'_>, _: Context<'_, S>) {
            if event.metadata().target() != "dispatch" {
                return;
            }
            let mut fields = HashMap::new();
            event.record(&mut Fields(&mut fields));
            self.0.lock().unwrap().push(Event {
                level: *event.metadata().level(),
                fields,
            });
        }
    }

    #[test]
    fn each_dispatch_logs_one_event() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let registry = ToolRegistry::from_tools([calculator()]).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            dispatch(&"hi".into(), &ToolRegistry::new());
            dispatch(&"calculate 2+2".into(), &registry);
            dispatch(&"   ".into(), &registry);
            dispatch(&"calculate 1/0".into(), &registry);
        });

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 4, "{events:#?}");

        let expected = [
            (tracing::Level::INFO, "direct", None, "true"),
            (tracing::Level::INFO, "tool", Some("calculator"), "true"),
            (tracing::Level::WARN, "rejected", None, "false"),
            (tracing::Level::WARN, "tool", Some("calculator"), "false"),
        ];
        for (event, (level, path, tool, succeeded)) in events.iter().zip(expected) {
            assert_eq!(event.level, level);
            assert_eq!(event.fields["path"], path);
            assert_eq!(event.fields.get("tool").map(String::as_str), tool);
            assert_eq!(event.fields["succeeded"], succeeded);
            assert_eq!(event.fields.contains_key("error"), level == tracing::Level::WARN);
        }
        assert!(events[3].fields["error"].contains("division by zero"));
    }

    #[test]
    fn result_serializes_without_error_detail() {
        let registry = ToolRegistry::from_tools([calculator()]).unwrap();
        let result = dispatch(&"calculate 1/0".into(), &registry);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["used_tool"], "calculator");
        assert_eq!(json["succeeded"], false);
        assert!(json.get("error").is_none());

        let direct = serde_json::to_value(dispatch(&"hi".into(), &ToolRegistry::new())).unwrap();
        assert!(direct.get("used_tool").is_none());
    }
}
