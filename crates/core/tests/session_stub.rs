//! Session behavior against a recording stub driver.
//!
//! The stub keeps a tiny in-memory engine: a variable workspace, the
//! implicit `ans` slot, and just enough expression handling (`clear`,
//! `name = a * b`, function calls over variable names) to exercise the
//! dispatch protocol end-to-end while logging every driver operation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use oct::{Driver, Error, Handle, LaunchConfig, Registry, Result, Session, Value};

#[derive(Debug, Clone, PartialEq)]
enum Op {
	Open,
	Eval(String),
	Put(String),
	Get(String),
	Close,
}

#[derive(Default)]
struct EngineState {
	vars: BTreeMap<String, Value>,
	ans: Option<Value>,
	log: Vec<Op>,
	/// When set, any `clear` evaluation fails with this diagnostic.
	refuse_clear: Option<String>,
}

impl EngineState {
	fn lookup_num(&self, name: &str) -> Result<f64> {
		let value = self
			.vars
			.get(name)
			.ok_or_else(|| Error::Evaluation(format!("'{name}' undefined")))?;
		value
			.as_num()
			.ok_or_else(|| Error::Evaluation(format!("'{name}' is not numeric")))
	}

	fn run(&mut self, expr: &str) -> Result<()> {
		if let Some(names) = expr.strip_prefix("clear ") {
			if let Some(diagnostic) = &self.refuse_clear {
				return Err(Error::Evaluation(diagnostic.clone()));
			}
			for name in names.split_whitespace() {
				// Real engines tolerate clearing names that were never set.
				self.vars.remove(name);
			}
			return Ok(());
		}

		if let Some((target, rhs)) = expr.split_once('=') {
			let (a, b) = rhs
				.split_once('*')
				.ok_or_else(|| Error::Evaluation(format!("parse error: {expr}")))?;
			let product = self.lookup_num(a.trim())? * self.lookup_num(b.trim())?;
			let result = Value::Num(product);
			self.vars.insert(target.trim().to_string(), result.clone());
			self.ans = Some(result);
			return Ok(());
		}

		if let Some((function, rest)) = expr.split_once('(') {
			let args = rest
				.strip_suffix(')')
				.ok_or_else(|| Error::Evaluation(format!("parse error: {expr}")))?;
			let mut operands = Vec::new();
			for arg in args.split(',').map(str::trim).filter(|a| !a.is_empty()) {
				operands.push(self.lookup_num(arg)?);
			}
			let result = match function {
				"explode" => return Err(Error::Evaluation("explode: boom".to_string())),
				"sqrt" => operands
					.first()
					.copied()
					.ok_or_else(|| Error::Evaluation("sqrt: missing operand".to_string()))?
					.sqrt(),
				_ => operands.iter().sum(),
			};
			self.ans = Some(Value::Num(result));
			return Ok(());
		}

		// Anything else (prelude, configuration chatter) is a no-op.
		Ok(())
	}
}

struct StubDriver {
	state: Arc<Mutex<EngineState>>,
}

impl Driver for StubDriver {
	fn open(&mut self, _launch: &LaunchConfig) -> Result<Handle> {
		self.state.lock().unwrap().log.push(Op::Open);
		Ok(Handle::new(1))
	}

	fn eval_string(&mut self, _handle: &Handle, expr: &str) -> Result<()> {
		let mut state = self.state.lock().unwrap();
		state.log.push(Op::Eval(expr.to_string()));
		state.run(expr)
	}

	fn put_variable(&mut self, _handle: &Handle, name: &str, value: &Value) -> Result<()> {
		let mut state = self.state.lock().unwrap();
		state.log.push(Op::Put(name.to_string()));
		state.vars.insert(name.to_string(), value.clone());
		Ok(())
	}

	fn get_variable(&mut self, _handle: &Handle, name: &str) -> Result<Value> {
		let mut state = self.state.lock().unwrap();
		state.log.push(Op::Get(name.to_string()));
		if name == "ans" {
			return state
				.ans
				.clone()
				.ok_or_else(|| Error::VariableNotFound(name.to_string()));
		}
		state
			.vars
			.get(name)
			.cloned()
			.ok_or_else(|| Error::VariableNotFound(name.to_string()))
	}

	fn close(&mut self, _handle: Handle) -> Result<()> {
		self.state.lock().unwrap().log.push(Op::Close);
		Ok(())
	}
}

fn stub_session() -> (Session, Arc<Mutex<EngineState>>) {
	let state = Arc::new(Mutex::new(EngineState::default()));
	let driver = Box::new(StubDriver {
		state: Arc::clone(&state),
	}) as Box<dyn Driver>;
	let session = Session::open(driver, &LaunchConfig::default()).unwrap();
	(session, state)
}

fn temp_count(state: &EngineState) -> usize {
	state.vars.keys().filter(|k| k.starts_with("oct_tmp_")).count()
}

#[test]
fn open_then_close_leaves_a_clean_workspace() {
	let (session, state) = stub_session();
	session.close().unwrap();

	let state = state.lock().unwrap();
	assert!(state.vars.is_empty());
	assert_eq!(state.log, vec![Op::Open, Op::Close]);
}

#[test]
fn set_then_get_round_trips_every_supported_shape() {
	let (session, _state) = stub_session();
	let cases = [
		Value::Num(123.456),
		Value::Num(f64::INFINITY),
		Value::Bool(true),
		Value::Str("row vector of chars".to_string()),
		Value::Matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
		Value::Empty,
	];
	for value in cases {
		session.set_variable("v", value.clone()).unwrap();
		assert_eq!(session.get_variable("v").unwrap(), value);
	}
	session.close().unwrap();
}

#[test]
fn passthrough_evaluation_scenario() {
	let (session, _state) = stub_session();
	session.set_variable("x", 123.456).unwrap();
	session.set_variable("y", 789.101112).unwrap();
	session.eval("z = x * y").unwrap();
	let z = session.get_variable("z").unwrap();
	assert_eq!(z, Value::Num(123.456 * 789.101112));
	session.close().unwrap();
}

#[test]
fn sqrt_dispatch_runs_the_exact_protocol_sequence() {
	let (session, state) = stub_session();
	let result = session.call("sqrt", &[Value::Num(16.0)]).unwrap();
	assert_eq!(result, Value::Num(4.0));

	let state = state.lock().unwrap();
	assert_eq!(
		state.log,
		vec![
			Op::Open,
			Op::Put("oct_tmp_sqrt_0".to_string()),
			Op::Eval("sqrt(oct_tmp_sqrt_0)".to_string()),
			Op::Get("ans".to_string()),
			Op::Eval("clear oct_tmp_sqrt_0".to_string()),
		]
	);
	assert_eq!(temp_count(&state), 0);
}

#[test]
fn call_creates_exactly_n_temporaries_and_clears_them_all() {
	let (session, state) = stub_session();
	let args = [Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)];
	let result = session.call("addall", &args).unwrap();
	assert_eq!(result, Value::Num(6.0));

	let state = state.lock().unwrap();
	let puts: Vec<_> = state
		.log
		.iter()
		.filter_map(|op| match op {
			Op::Put(name) => Some(name.as_str()),
			_ => None,
		})
		.collect();
	assert_eq!(
		puts,
		["oct_tmp_addall_0", "oct_tmp_addall_1", "oct_tmp_addall_2"]
	);
	let clears: Vec<_> = state
		.log
		.iter()
		.filter(|op| matches!(op, Op::Eval(e) if e.starts_with("clear ")))
		.collect();
	assert_eq!(
		clears,
		[&Op::Eval("clear oct_tmp_addall_0 oct_tmp_addall_1 oct_tmp_addall_2".to_string())]
	);
	assert_eq!(temp_count(&state), 0);
}

#[test]
fn failed_dispatch_still_clears_its_temporaries() {
	let (session, state) = stub_session();
	let args = [Value::Num(1.0), Value::Num(2.0)];
	match session.call("explode", &args) {
		Err(Error::Evaluation(msg)) => assert_eq!(msg, "explode: boom"),
		other => panic!("expected the engine diagnostic, got {other:?}"),
	}

	let state = state.lock().unwrap();
	assert_eq!(temp_count(&state), 0);
	assert!(
		state
			.log
			.iter()
			.any(|op| matches!(op, Op::Eval(e) if e.starts_with("clear "))),
		"cleanup must run on the error path"
	);
}

#[test]
fn cleanup_failure_after_success_surfaces() {
	let (session, state) = stub_session();
	state.lock().unwrap().refuse_clear = Some("clear refused".to_string());

	match session.call("sqrt", &[Value::Num(9.0)]) {
		Err(Error::Evaluation(msg)) => assert_eq!(msg, "clear refused"),
		other => panic!("expected the cleanup failure, got {other:?}"),
	}
}

#[test]
fn cleanup_failure_never_masks_the_original_error() {
	let (session, state) = stub_session();
	state.lock().unwrap().refuse_clear = Some("clear refused".to_string());

	match session.call("explode", &[Value::Num(1.0)]) {
		Err(Error::Evaluation(msg)) => assert_eq!(msg, "explode: boom"),
		other => panic!("expected the original dispatch error, got {other:?}"),
	}
}

#[test]
fn zero_argument_call_issues_no_puts_and_no_clear() {
	let (session, state) = stub_session();
	// Zero operands: the stub sums an empty list.
	let result = session.call("rand", &[]).unwrap();
	assert_eq!(result, Value::Num(0.0));

	let state = state.lock().unwrap();
	assert!(!state.log.iter().any(|op| matches!(op, Op::Put(_))));
	assert!(
		!state
			.log
			.iter()
			.any(|op| matches!(op, Op::Eval(e) if e.starts_with("clear ")))
	);
}

#[test]
fn operations_after_close_touch_no_driver() {
	let (session, state) = stub_session();
	session.close().unwrap();
	let log_len = state.lock().unwrap().log.len();

	assert!(matches!(session.eval("x = 1 * 1"), Err(Error::Usage(_))));
	assert!(matches!(
		session.call("sqrt", &[Value::Num(4.0)]),
		Err(Error::Usage(_))
	));
	assert_eq!(state.lock().unwrap().log.len(), log_len);
}

#[test]
fn scoped_session_closes_on_the_error_path() {
	let state = Arc::new(Mutex::new(EngineState::default()));
	let driver = Box::new(StubDriver {
		state: Arc::clone(&state),
	}) as Box<dyn Driver>;

	let outcome: Result<()> = Session::with(driver, &LaunchConfig::default(), |engine| {
		engine.set_variable("x", 1.0)?;
		Err(Error::Evaluation("body bailed".to_string()))
	});
	assert!(matches!(outcome, Err(Error::Evaluation(_))));

	let state = state.lock().unwrap();
	assert_eq!(state.log.last(), Some(&Op::Close));
}

#[test]
fn scoped_session_closes_exactly_once_on_success() {
	let state = Arc::new(Mutex::new(EngineState::default()));
	let driver = Box::new(StubDriver {
		state: Arc::clone(&state),
	}) as Box<dyn Driver>;

	let doubled = Session::with(driver, &LaunchConfig::default(), |engine| {
		engine.set_variable("a", 21.0)?;
		engine.set_variable("two", 2.0)?;
		engine.eval("d = a * two")?;
		engine.get_variable("d")
	})
	.unwrap();
	assert_eq!(doubled, Value::Num(42.0));

	let state = state.lock().unwrap();
	let closes = state.log.iter().filter(|op| **op == Op::Close).count();
	assert_eq!(closes, 1);
}

#[test]
fn unknown_driver_name_fails_without_discovery_fallback() {
	let outcome = Session::open_with_registry(
		&Registry::builtin(),
		"nonesuch",
		&LaunchConfig::default(),
	);
	match outcome {
		Err(Error::DriverNotFound(name)) => assert_eq!(name, "nonesuch"),
		other => panic!("expected DriverNotFound, got {other:?}"),
	}
}
