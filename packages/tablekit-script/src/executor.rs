//! Sandboxed script execution.
//!
//! Each run gets a fresh boa interpreter on its own OS thread. The caller
//! waits on a channel with a wall-clock deadline. The worker stops on its
//! own: the job queue refuses to run promise jobs past the same deadline,
//! and the loop and recursion limits bound synchronous code.
//!
//! Before user code runs, dynamic code evaluation is disabled and the
//! reflective globals are removed. The only host functions are the field
//! accessors, `sendEmail` and `console`.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use boa_engine::builtins::promise::PromiseState;
use boa_engine::job::{GenericJob, Job, JobExecutor, PromiseJob};
use boa_engine::object::builtins::JsPromise;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::vm::RuntimeLimits;
use boa_engine::{
    js_string, Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue,
    NativeFunction, Source,
};
use boa_gc::{empty_trace, Finalize, Trace};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use tablekit_core::config::ScriptConfig;
use tablekit_core::storage::Row;

use crate::binder::{coerce_field_value, normalize_field_id, Binding, Coerced};
use crate::email::EmailRequest;
use crate::error::{Result, ScriptError};
use crate::normalizer;
use crate::ScriptContext;

const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;
const CONSOLE_TARGET: &str = "tablekit::script::console";

const WRAPPER_HEAD: &str = "(async function () {\n";
const WRAPPER_TAIL: &str = "\n})()";

/// Runs before user code in every interpreter.
const HARDENING_PRELUDE: &str = r#"
(function () {
  var blocked = function () {
    throw new EvalError('Dynamic code evaluation is disabled');
  };
  var lock = function (target, key) {
    Object.defineProperty(target, key, {
      value: blocked,
      writable: false,
      enumerable: false,
      configurable: false
    });
  };
  [
    Function.prototype,
    Object.getPrototypeOf(function* () {}),
    Object.getPrototypeOf(async function () {}),
    Object.getPrototypeOf(async function* () {})
  ].forEach(function (proto) { lock(proto, 'constructor'); });
  lock(globalThis, 'eval');
  lock(globalThis, 'Function');
  ['Reflect', 'Proxy', 'WeakRef', 'FinalizationRegistry', 'SharedArrayBuffer', 'Atomics']
    .forEach(function (name) { delete globalThis[name]; });
})();
"#;

static BANNED_TOKENS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("eval(", r"\beval\s*\("),
        ("Function(", r"\bFunction\s*\("),
        ("import(", r"\bimport\s*\("),
        ("require(", r"\brequire\s*\("),
        ("process.", r"\bprocess\s*\."),
        ("globalThis.constructor", r"\bglobalThis\s*\.\s*constructor\b"),
    ]
    .into_iter()
    .map(|(token, pattern)| (token, Regex::new(pattern).expect("valid banned token pattern")))
    .collect()
});

/// Everything a single run can see besides the built-ins.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    /// Row exposed as `doc`
    pub doc: Row,
    /// Values exposed as `userAction`, `executionMoment`, `userId`, `tableId`
    pub context: ScriptContext,
    /// Field variables
    pub bindings: Vec<Binding>,
}

/// Outcome of one run.
///
/// On failure `doc` is the row exactly as it was handed in.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Value the script returned, as JSON
    pub result: Option<Value>,
    pub error: Option<String>,
    /// The run hit the wall-clock deadline
    pub timed_out: bool,
    pub doc: Row,
    /// Messages queued through `sendEmail`
    pub emails: Vec<EmailRequest>,
}

impl ExecutionResult {
    fn untouched(doc: Row) -> Self {
        Self {
            success: true,
            result: None,
            error: None,
            timed_out: false,
            doc,
            emails: Vec::new(),
        }
    }

    /// Failed run that leaves `doc` as given.
    pub fn failed(doc: Row, err: &ScriptError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            timed_out: err.is_timeout(),
            doc,
            emails: Vec::new(),
        }
    }
}

/// Data produced by a run that completed.
struct Completed {
    doc: Row,
    result: Option<Value>,
    emails: Vec<EmailRequest>,
}

/// Runs scripts in isolated interpreters.
#[derive(Debug, Clone)]
pub struct SandboxExecutor {
    config: ScriptConfig,
}

impl SandboxExecutor {
    /// Creates a new executor with the given limits.
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Executes `code` against a sandbox.
    ///
    /// Never fails: every error is logged and reported in the result.
    ///
    /// # Arguments
    /// * `code` - Normalized, bound script text
    /// * `sandbox` - Row, context values and field variables
    ///
    /// # Returns
    /// `ExecutionResult` with the updated row on success or the original row
    /// and the error message on failure.
    pub fn execute(&self, code: &str, sandbox: Sandbox) -> ExecutionResult {
        if code.trim().is_empty() {
            return ExecutionResult::untouched(sandbox.doc);
        }

        let original = sandbox.doc.clone();
        match self.run(code, sandbox) {
            Ok(completed) => ExecutionResult {
                success: true,
                result: completed.result,
                error: None,
                timed_out: false,
                doc: completed.doc,
                emails: completed.emails,
            },
            Err(err) => {
                match err.stack() {
                    Some(stack) => error!("Script execution failed: {}\n{}\n{}", err, stack, code),
                    None => error!("Script execution failed: {}\n{}", err, code),
                }
                ExecutionResult::failed(original, &err)
            }
        }
    }

    fn run(&self, code: &str, sandbox: Sandbox) -> Result<Completed> {
        check_banned(code)?;

        let source = wrap(code);
        let limits = self.config.clone();
        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("tablekit-script".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let outcome = evaluate(&source, sandbox, &limits, deadline);
                // the receiver is gone once the deadline has passed
                let _ = tx.send(outcome);
            })
            .map_err(|e| ScriptError::Worker(e.to_string()))?;

        match rx.recv_timeout(Duration::from_millis(self.config.timeout_ms)) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(ScriptError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(ScriptError::Worker(
                "script worker exited without a result".to_string(),
            )),
        }
    }
}

/// Rejects code that uses a banned construct outside literals and comments.
///
/// Member accesses such as `doc.process` name properties, not globals, and
/// pass.
pub fn check_banned(code: &str) -> Result<()> {
    let masked = normalizer::mask(code);
    for (token, pattern) in BANNED_TOKENS.iter() {
        let used = pattern
            .find_iter(&masked)
            .any(|found| !masked[..found.start()].trim_end().ends_with('.'));
        if used {
            return Err(ScriptError::Rejected {
                token: token.to_string(),
            });
        }
    }
    Ok(())
}

fn wrap(code: &str) -> String {
    format!("{}{}{}", WRAPPER_HEAD, code, WRAPPER_TAIL)
}

/// Job queue of one run. Refuses to run jobs once the deadline has passed.
struct DeadlineJobs {
    deadline: Instant,
    expired: Cell<bool>,
    promise_jobs: RefCell<VecDeque<PromiseJob>>,
    generic_jobs: RefCell<VecDeque<GenericJob>>,
}

impl DeadlineJobs {
    fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            expired: Cell::new(false),
            promise_jobs: RefCell::new(VecDeque::new()),
            generic_jobs: RefCell::new(VecDeque::new()),
        }
    }

    fn expired(&self) -> bool {
        self.expired.get()
    }

    fn clear(&self) {
        self.promise_jobs.borrow_mut().clear();
        self.generic_jobs.borrow_mut().clear();
    }

    fn next_job(&self) -> Option<Job> {
        let promise = self.promise_jobs.borrow_mut().pop_front();
        match promise {
            Some(job) => Some(Job::PromiseJob(job)),
            None => self.generic_jobs.borrow_mut().pop_front().map(Job::GenericJob),
        }
    }
}

impl JobExecutor for DeadlineJobs {
    fn enqueue_job(self: Rc<Self>, job: Job, _context: &mut Context) {
        match job {
            Job::PromiseJob(job) => self.promise_jobs.borrow_mut().push_back(job),
            Job::GenericJob(job) => self.generic_jobs.borrow_mut().push_back(job),
            // the sandbox installs nothing that schedules timers or host futures
            _ => warn!("Dropping unsupported script job"),
        }
    }

    fn run_jobs(self: Rc<Self>, context: &mut Context) -> JsResult<()> {
        loop {
            if Instant::now() >= self.deadline {
                self.expired.set(true);
                self.clear();
                return Err(JsNativeError::error()
                    .with_message("Script exceeded its time budget")
                    .into());
            }
            let outcome = match self.next_job() {
                Some(Job::PromiseJob(job)) => job.call(context),
                Some(Job::GenericJob(job)) => job.call(context),
                Some(_) | None => break,
            };
            if let Err(err) = outcome {
                self.clear();
                return Err(err);
            }
        }
        context.clear_kept_objects();
        Ok(())
    }
}

/// Interpreter side of a run. Called on the worker thread.
fn evaluate(
    source: &str,
    sandbox: Sandbox,
    config: &ScriptConfig,
    deadline: Instant,
) -> Result<Completed> {
    let jobs = Rc::new(DeadlineJobs::new(deadline));
    let mut context = Context::builder()
        .job_executor(jobs.clone())
        .build()
        .map_err(|err| ScriptError::Worker(err.to_string()))?;
    let mut limits = RuntimeLimits::default();
    limits.set_loop_iteration_limit(config.loop_iteration_limit);
    limits.set_recursion_limit(config.recursion_limit);
    limits.set_stack_size_limit(config.stack_size_limit);
    context.set_runtime_limits(limits);
    let ctx = &mut context;

    let state = Rc::new(RefCell::new(NativeState::new(&sandbox.bindings)));
    let stringify = prepare(ctx, &sandbox, &state)
        .map_err(|err| ScriptError::Worker(describe_error(&err, ctx)))?;

    let completion = ctx
        .eval(Source::from_bytes(source))
        .and_then(|value| settle(value, ctx));
    let returned = match completion {
        Ok(value) => value,
        Err(_) if jobs.expired() => {
            return Err(ScriptError::Timeout {
                timeout_ms: config.timeout_ms,
            })
        }
        Err(err) => return Err(thrown(&err, ctx)),
    };

    let doc_value = ctx
        .global_object()
        .get(js_string!("doc"), ctx)
        .map_err(|err| thrown(&err, ctx))?;
    let mut doc = match to_json(&stringify, &doc_value, ctx)? {
        Some(Value::Object(doc)) => doc,
        _ => {
            return Err(ScriptError::Exception {
                message: "doc must remain an object".to_string(),
                stack: None,
            })
        }
    };

    for binding in &sandbox.bindings {
        let value = ctx
            .global_object()
            .get(JsString::from(binding.name.as_str()), ctx)
            .map_err(|err| thrown(&err, ctx))?;
        if let Some(json) = to_json(&stringify, &value, ctx)? {
            doc.insert(binding.field.clone(), json);
        }
    }

    let result = to_json(&stringify, &returned, ctx)?;
    let emails = std::mem::take(&mut state.borrow_mut().emails);
    debug!("Script completed with {} queued emails", emails.len());

    Ok(Completed {
        doc,
        result,
        emails,
    })
}

/// Hardens the realm and installs the globals.
///
/// # Returns
/// The `JSON.stringify` function as it was before user code could touch it.
fn prepare(
    ctx: &mut Context,
    sandbox: &Sandbox,
    state: &Rc<RefCell<NativeState>>,
) -> JsResult<JsObject> {
    let stringify = json_stringify(ctx)?;
    ctx.eval(Source::from_bytes(HARDENING_PRELUDE))?;

    let doc = JsValue::from_json(&Value::Object(sandbox.doc.clone()), ctx)?;
    ctx.register_global_property(js_string!("doc"), doc, Attribute::all())?;

    for (name, value) in sandbox.context.globals() {
        let value = JsValue::from_json(&value, ctx)?;
        ctx.register_global_property(JsString::from(name), value, Attribute::all())?;
    }

    for binding in &sandbox.bindings {
        let value = match &binding.value {
            Some(value) => JsValue::from_json(value, ctx)?,
            None => JsValue::undefined(),
        };
        ctx.register_global_property(
            JsString::from(binding.name.as_str()),
            value,
            Attribute::all(),
        )?;
    }

    ctx.register_global_callable(
        js_string!("getFieldValue"),
        1,
        NativeFunction::from_fn_ptr(get_field_value),
    )?;
    ctx.register_global_callable(
        js_string!("setFieldValue"),
        2,
        NativeFunction::from_copy_closure_with_captures(
            set_field_value,
            NativeCapture {
                state: state.clone(),
            },
        ),
    )?;
    ctx.register_global_callable(
        js_string!("sendEmail"),
        3,
        NativeFunction::from_copy_closure_with_captures(
            send_email,
            NativeCapture {
                state: state.clone(),
            },
        ),
    )?;

    let console = ObjectInitializer::new(ctx)
        .function(NativeFunction::from_fn_ptr(console_log), js_string!("log"), 0)
        .function(NativeFunction::from_fn_ptr(console_info), js_string!("info"), 0)
        .function(NativeFunction::from_fn_ptr(console_debug), js_string!("debug"), 0)
        .function(NativeFunction::from_fn_ptr(console_warn), js_string!("warn"), 0)
        .function(NativeFunction::from_fn_ptr(console_error), js_string!("error"), 0)
        .build();
    ctx.register_global_property(js_string!("console"), console, Attribute::all())?;

    Ok(stringify)
}

/// Resolves the promise returned by the async wrapper.
fn settle(value: JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    let promise = value
        .as_object()
        .and_then(|object| JsPromise::from_object(object.clone()).ok());
    let Some(promise) = promise else {
        return Ok(value);
    };

    ctx.run_jobs()?;
    match promise.state() {
        PromiseState::Fulfilled(result) => Ok(result),
        PromiseState::Rejected(reason) => Err(JsError::from_opaque(reason)),
        PromiseState::Pending => Err(JsNativeError::error()
            .with_message("Script did not settle")
            .into()),
    }
}

fn json_stringify(ctx: &mut Context) -> JsResult<JsObject> {
    let json = ctx.global_object().get(js_string!("JSON"), ctx)?;
    let stringify = match json.as_object() {
        Some(json) => json.get(js_string!("stringify"), ctx)?,
        None => JsValue::undefined(),
    };
    match stringify.as_object() {
        Some(function) if function.is_callable() => Ok(function.clone()),
        _ => Err(JsNativeError::typ()
            .with_message("JSON.stringify is unavailable")
            .into()),
    }
}

/// Converts a script value to JSON. `undefined` and functions give `None`.
fn to_json(stringify: &JsObject, value: &JsValue, ctx: &mut Context) -> Result<Option<Value>> {
    let text = stringify
        .call(&JsValue::undefined(), &[value.clone()], ctx)
        .map_err(|err| thrown(&err, ctx))?;
    match text.as_string() {
        Some(text) => serde_json::from_str(&text.to_std_string_escaped())
            .map(Some)
            .map_err(|e| ScriptError::Worker(e.to_string())),
        None => Ok(None),
    }
}

fn thrown(err: &JsError, ctx: &mut Context) -> ScriptError {
    let message = describe_error(err, ctx);
    let stack = error_stack(err, ctx).filter(|stack| *stack != message);
    ScriptError::Exception { message, stack }
}

/// The `stack` property of a thrown object, else boa's own trace of the error.
fn error_stack(err: &JsError, ctx: &mut Context) -> Option<String> {
    if let Some(object) = err.as_opaque().and_then(JsValue::as_object) {
        if let Ok(stack) = object.get(js_string!("stack"), ctx) {
            if let Some(stack) = stack.as_string() {
                return Some(stack.to_std_string_escaped());
            }
        }
    }
    Some(err.to_string())
}

/// Message of a script error as the script author would read it.
fn describe_error(err: &JsError, ctx: &mut Context) -> String {
    if let Ok(native) = err.try_native(ctx) {
        let message = native.message().to_string();
        return if message.is_empty() {
            native.to_string()
        } else {
            message
        };
    }
    match err.as_opaque() {
        Some(value) => value
            .to_string(ctx)
            .map(|text| text.to_std_string_escaped())
            .unwrap_or_else(|_| "Unknown script error".to_string()),
        None => err.to_string(),
    }
}

/// Host state shared by the natives of one run.
struct NativeState {
    /// Row key to variable name
    variables: HashMap<String, String>,
    emails: Vec<EmailRequest>,
}

impl NativeState {
    fn new(bindings: &[Binding]) -> Self {
        Self {
            variables: bindings
                .iter()
                .map(|binding| (binding.field.clone(), binding.name.clone()))
                .collect(),
            emails: Vec::new(),
        }
    }
}

#[derive(Finalize)]
struct NativeCapture {
    state: Rc<RefCell<NativeState>>,
}

// holds no garbage-collected values
unsafe impl Trace for NativeCapture {
    empty_trace!();
}

fn current_doc(ctx: &mut Context) -> JsResult<JsObject> {
    let doc = ctx.global_object().get(js_string!("doc"), ctx)?;
    match doc.as_object() {
        Some(doc) => Ok(doc.clone()),
        None => Err(JsNativeError::typ()
            .with_message("doc is not an object")
            .into()),
    }
}

fn arg_string(args: &[JsValue], index: usize, ctx: &mut Context) -> JsResult<String> {
    Ok(args
        .get_or_undefined(index)
        .to_string(ctx)?
        .to_std_string_escaped())
}

fn get_field_value(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let raw = arg_string(args, 0, ctx)?;
    let key = normalize_field_id(&raw);
    let doc = current_doc(ctx)?;

    let value = doc.get(JsString::from(key.as_str()), ctx)?;
    let original = raw.strip_prefix('$').unwrap_or(&raw);
    if !value.is_undefined() || original == key {
        return Ok(value);
    }
    doc.get(JsString::from(original), ctx)
}

fn set_field_value(
    _this: &JsValue,
    args: &[JsValue],
    capture: &NativeCapture,
    ctx: &mut Context,
) -> JsResult<JsValue> {
    match write_field(args, capture, ctx) {
        Ok(value) => Ok(reply(ctx, true, &[("value", value)])),
        Err(err) => {
            let message = JsValue::from(JsString::from(describe_error(&err, ctx).as_str()));
            Ok(reply(ctx, false, &[("error", message)]))
        }
    }
}

fn write_field(args: &[JsValue], capture: &NativeCapture, ctx: &mut Context) -> JsResult<JsValue> {
    let raw = arg_string(args, 0, ctx)?;
    let key = normalize_field_id(&raw);
    let original = raw.strip_prefix('$').unwrap_or(&raw).to_string();
    let value = coerce(args.get_or_undefined(1), ctx)?;

    let doc = current_doc(ctx)?;
    doc.set(JsString::from(key.as_str()), value.clone(), true, ctx)?;
    if original != key {
        doc.set(JsString::from(original.as_str()), value.clone(), true, ctx)?;
    }

    let variable = capture.state.borrow().variables.get(&key).cloned();
    if let Some(name) = variable {
        ctx.global_object()
            .set(JsString::from(name.as_str()), value.clone(), true, ctx)?;
    }
    Ok(value)
}

/// Applies string coercion to a value passed to `setFieldValue`.
fn coerce(value: &JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    let Some(text) = value.as_string() else {
        return Ok(value.clone());
    };
    match coerce_field_value(&text.to_std_string_escaped()) {
        Coerced::Integer(n) => Ok(i32::try_from(n)
            .map(JsValue::from)
            .unwrap_or_else(|_| JsValue::from(n as f64))),
        Coerced::Float(n) => Ok(JsValue::from(n)),
        Coerced::Bool(b) => Ok(JsValue::from(b)),
        Coerced::Date(iso) => {
            let constructor = ctx.intrinsics().constructors().date().constructor();
            let date = constructor.construct(
                &[JsValue::from(JsString::from(iso.as_str()))],
                None,
                ctx,
            )?;
            Ok(date.into())
        }
        Coerced::Text(_) => Ok(value.clone()),
    }
}

fn send_email(
    _this: &JsValue,
    args: &[JsValue],
    capture: &NativeCapture,
    ctx: &mut Context,
) -> JsResult<JsValue> {
    let request = match read_email(args, ctx) {
        Ok(request) => request,
        Err(err) => Err(describe_error(&err, ctx)),
    };

    match request {
        Ok(request) => {
            let queued = request.to.len() as u32;
            capture.state.borrow_mut().emails.push(request);
            Ok(reply(ctx, true, &[("queued", JsValue::from(queued))]))
        }
        Err(message) => {
            warn!("sendEmail rejected: {}", message);
            let message = JsValue::from(JsString::from(message.as_str()));
            Ok(reply(ctx, false, &[("error", message)]))
        }
    }
}

/// Reads `sendEmail` arguments. The outer error is a script exception, the
/// inner one a validation message.
fn read_email(
    args: &[JsValue],
    ctx: &mut Context,
) -> JsResult<std::result::Result<EmailRequest, String>> {
    let recipients = args.get_or_undefined(0);
    let mut to = Vec::new();
    if let Some(text) = recipients.as_string() {
        to.push(text.to_std_string_escaped());
    } else if let Some(list) = recipients.as_object() {
        if list.is_array() {
            let length = list.get(js_string!("length"), ctx)?.to_length(ctx)?;
            for index in 0..length {
                let item = list.get(index as u32, ctx)?;
                to.push(item.to_string(ctx)?.to_std_string_escaped());
            }
        }
    }

    let subject = optional_string(args.get_or_undefined(1), ctx)?;
    let body = optional_string(args.get_or_undefined(2), ctx)?;
    Ok(EmailRequest::new(to, subject, body))
}

fn optional_string(value: &JsValue, ctx: &mut Context) -> JsResult<String> {
    if value.is_null_or_undefined() {
        return Ok(String::new());
    }
    Ok(value.to_string(ctx)?.to_std_string_escaped())
}

/// Builds the `{success, ...}` object natives hand back to scripts.
fn reply(ctx: &mut Context, success: bool, entries: &[(&str, JsValue)]) -> JsValue {
    let mut object = ObjectInitializer::new(ctx);
    object.property(js_string!("success"), success, Attribute::all());
    for (key, value) in entries {
        object.property(JsString::from(*key), value.clone(), Attribute::all());
    }
    object.build().into()
}

fn console_line(args: &[JsValue], ctx: &mut Context) -> String {
    args.iter()
        .map(|value| display_value(value, ctx))
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_value(value: &JsValue, ctx: &mut Context) -> String {
    if let Some(text) = value.as_string() {
        return text.to_std_string_escaped();
    }
    if value.is_object() {
        if let Ok(stringify) = json_stringify(ctx) {
            if let Ok(text) = stringify.call(&JsValue::undefined(), &[value.clone()], ctx) {
                if let Some(text) = text.as_string() {
                    return text.to_std_string_escaped();
                }
            }
        }
    }
    value
        .to_string(ctx)
        .map(|text| text.to_std_string_escaped())
        .unwrap_or_default()
}

fn console_log(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let line = console_line(args, ctx);
    info!(target: CONSOLE_TARGET, "{}", line);
    Ok(JsValue::undefined())
}

fn console_info(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let line = console_line(args, ctx);
    info!(target: CONSOLE_TARGET, "{}", line);
    Ok(JsValue::undefined())
}

fn console_debug(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let line = console_line(args, ctx);
    debug!(target: CONSOLE_TARGET, "{}", line);
    Ok(JsValue::undefined())
}

fn console_warn(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let line = console_line(args, ctx);
    warn!(target: CONSOLE_TARGET, "{}", line);
    Ok(JsValue::undefined())
}

fn console_error(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let line = console_line(args, ctx);
    error!(target: CONSOLE_TARGET, "{}", line);
    Ok(JsValue::undefined())
}
