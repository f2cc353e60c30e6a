//! Sandboxed code execution.
//!
//! Snippets run in a fresh Lua 5.4 VM per call, on a dedicated OS thread
//! that reports back over a oneshot channel. The VM loads only the
//! `table`, `string`, `math` and `utf8` libraries, so there is no
//! filesystem, process or module access.
//!
//! Each run is raced against [`EXECUTION_BUDGET`]. When the timer wins
//! the caller gets [`ToolError::Timeout`] straight away and the thread is
//! detached; an instruction-count hook sees the cancel flag and stops
//! the VM at its next check. A thread stuck inside one long C call
//! (pattern matching, `string.rep`) runs on until that call returns, but
//! nothing waits for it, so runtime shutdown is never held up.

use std::collections::HashSet;
use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mlua::{HookTriggers, Lua, LuaOptions, StdLib, Value as LuaValue, VmState};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::{string_arg, Tool, ToolError, ToolResult};

/// Hard wall-clock limit for one snippet.
pub const EXECUTION_BUDGET: Duration = Duration::from_millis(2000);

/// Per-VM allocation cap.
const MEMORY_LIMIT: usize = 32 * 1024 * 1024;

/// VM instructions between cancellation checks.
const HOOK_INTERVAL: u32 = 1000;

/// Deepest table nesting converted to JSON.
const MAX_RESULT_DEPTH: usize = 128;

/// Base-library globals removed from every VM.
const BLOCKED_GLOBALS: &[&str] = &["dofile", "loadfile", "print", "collectgarbage"];

/// Evaluates Lua snippets under a time budget.
#[derive(Debug, Clone)]
pub struct LuaSandbox {
    budget: Duration,
}

impl Default for LuaSandbox {
    fn default() -> Self {
        Self {
            budget: EXECUTION_BUDGET,
        }
    }
}

impl LuaSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `code` and convert its value to JSON.
    ///
    /// `code` may be a bare expression (`1 + 1`) or a chunk that
    /// `return`s.
    pub async fn eval(&self, code: &str) -> Result<Value, ToolError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let budget = self.budget;
        let code = code.to_string();

        let (tx, rx) = oneshot::channel();
        let worker_cancel = cancel.clone();
        std::thread::Builder::new()
            .name("lua-sandbox".into())
            .spawn(move || {
                // The receiver is gone once the caller has timed out.
                let _ = tx.send(eval_blocking(&code, budget, &worker_cancel));
            })
            .map_err(|e| ToolError::Execution(format!("cannot start sandbox thread: {e}")))?;

        match tokio::time::timeout(budget, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ToolError::Execution(
                "sandbox thread exited without a result".into(),
            )),
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                warn!(budget_ms = budget.as_millis() as u64, "code execution timed out");
                Err(ToolError::Timeout)
            }
        }
    }
}

/// Runs on the sandbox thread; owns its VM for the whole call.
fn eval_blocking(
    code: &str,
    budget: Duration,
    cancel: &Arc<AtomicBool>,
) -> Result<Value, ToolError> {
    let started = Instant::now();
    let lua = create_sandboxed_lua(budget, cancel.clone())
        .map_err(|e| ToolError::Execution(first_line(&e)))?;

    let outcome = lua
        .load(code)
        .eval::<LuaValue>()
        .and_then(|value| lua_to_json(&value, 0, &mut HashSet::new()));

    match outcome {
        Ok(value) => {
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "snippet finished");
            Ok(value)
        }
        Err(_) if cancel.load(Ordering::SeqCst) || started.elapsed() >= budget => {
            Err(ToolError::Timeout)
        }
        Err(e) => Err(ToolError::Execution(first_line(&e))),
    }
}

fn create_sandboxed_lua(budget: Duration, cancel: Arc<AtomicBool>) -> mlua::Result<Lua> {
    let libs = StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8;
    let lua = Lua::new_with(libs, LuaOptions::default())?;
    lua.set_memory_limit(MEMORY_LIMIT)?;

    let globals = lua.globals();
    for name in BLOCKED_GLOBALS {
        globals.set(*name, LuaValue::Nil)?;
    }

    let deadline = Instant::now() + budget;
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
        move |_lua, _debug| {
            if cancel.load(Ordering::Relaxed) || Instant::now() >= deadline {
                Err(mlua::Error::RuntimeError("execution cancelled".into()))
            } else {
                Ok(VmState::Continue)
            }
        },
    );

    Ok(lua)
}

/// Lua error text without the stack traceback.
fn first_line(err: &mlua::Error) -> String {
    let text = err.to_string();
    text.lines().next().unwrap_or_default().to_string()
}

/// Convert a Lua value to JSON. Tables with a sequence part become arrays.
///
/// `open` holds the tables on the current path, so a table that contains
/// itself is an error rather than endless recursion. A table reachable
/// twice through different keys is fine and is converted twice.
fn lua_to_json(
    value: &LuaValue,
    depth: usize,
    open: &mut HashSet<*const c_void>,
) -> mlua::Result<Value> {
    match value {
        LuaValue::Nil => Ok(Value::Null),
        LuaValue::Boolean(b) => Ok(Value::Bool(*b)),
        LuaValue::Integer(i) => Ok(Value::Number((*i).into())),
        LuaValue::Number(n) => Ok(serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))),
        LuaValue::String(s) => Ok(Value::String(s.to_str()?.to_string())),
        LuaValue::Table(table) => {
            if depth >= MAX_RESULT_DEPTH {
                return Err(mlua::Error::RuntimeError(format!(
                    "result nested deeper than {MAX_RESULT_DEPTH} tables"
                )));
            }
            let ptr = table.to_pointer();
            if !open.insert(ptr) {
                return Err(mlua::Error::RuntimeError(
                    "result contains a table that refers to itself".into(),
                ));
            }
            let converted = table_to_json(table, depth + 1, open);
            open.remove(&ptr);
            converted
        }
        LuaValue::Function(_) => Ok(Value::String("[function]".to_string())),
        LuaValue::Thread(_) => Ok(Value::String("[thread]".to_string())),
        LuaValue::UserData(_) => Ok(Value::String("[userdata]".to_string())),
        LuaValue::LightUserData(_) => Ok(Value::String("[lightuserdata]".to_string())),
        LuaValue::Error(e) => Ok(Value::String(format!("[error: {e}]"))),
        _ => Ok(Value::Null),
    }
}

fn table_to_json(
    table: &mlua::Table,
    depth: usize,
    open: &mut HashSet<*const c_void>,
) -> mlua::Result<Value> {
    let len = table.raw_len();
    if len > 0 {
        let mut items = Vec::with_capacity(len);
        for i in 1..=len {
            let v: LuaValue = table.raw_get(i as i64)?;
            items.push(lua_to_json(&v, depth, open)?);
        }
        return Ok(Value::Array(items));
    }
    let mut obj = serde_json::Map::new();
    for pair in table.pairs::<LuaValue, LuaValue>() {
        let (k, v) = pair?;
        let key = match k {
            LuaValue::String(s) => s.to_str()?.to_string(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => n.to_string(),
            _ => continue,
        };
        obj.insert(key, lua_to_json(&v, depth, open)?);
    }
    Ok(Value::Object(obj))
}

/// `execute_code` (alias `run_js`): takes `code`.
#[derive(Debug, Clone, Default)]
pub struct ExecuteCodeTool {
    sandbox: LuaSandbox,
}

impl ExecuteCodeTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn name(&self) -> &'static str {
        "execute_code"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["run_js"]
    }

    fn description(&self) -> &'static str {
        "Evaluate a Lua snippet (2s limit)"
    }

    async fn call(&self, args: &Value) -> ToolResult {
        let Some(code) = string_arg(args, &["code"]) else {
            return ToolResult::text("No code provided");
        };
        self.sandbox.eval(&code).await.into()
    }
}
