//! Structured reporting of what the engine did, output as one JSON object.
//!
//! Values are reported within nested contexts opened through RAII guards,
//! somewhat isomorph to the callgraph.
//! The reporter is thread local. Without an installed reporter (library use, rayon workers)
//! all reporting is a no-op.
//! Reporting the same key twice in one object keeps the last value.

use crate::built_info;
use serde_json::{Map, Value};
use std::cell::RefCell;

pub use serde_json::json;

#[derive(Debug)]
enum Context {
    Object { key: Option<String>, object: Map<String, Value> },
    Collection { key: String, items: Vec<Value> },
}

#[derive(Debug)]
pub struct Reporter {
    // never empty, the first entry is the root object
    stack: Vec<Context>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            stack: vec![Context::Object { key: None, object: Map::new() }],
        }
    }
}

fn keyed(key: String, val: Value) -> Value {
    let mut object = Map::new();
    object.insert(key, val);
    Value::Object(object)
}

impl Reporter {
    fn push(&mut self, context: Context) {
        self.stack.push(context);
    }

    fn report(&mut self, key: String, val: Value) {
        match self.stack.last_mut() {
            Some(Context::Object { object, .. }) => {
                object.insert(key, val);
            }
            Some(Context::Collection { items, .. }) => items.push(keyed(key, val)),
            None => (),
        }
    }

    fn pop_context(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        let (key, val) = match self.stack.pop() {
            Some(Context::Object { key, object }) => (key, Value::Object(object)),
            Some(Context::Collection { key, items }) => (Some(key), Value::Array(items)),
            None => return,
        };

        match (self.stack.last_mut(), key) {
            (Some(Context::Object { object, .. }), Some(key)) => {
                object.insert(key, val);
            }
            // an item context closed directly inside an object, merge it
            (Some(Context::Object { object, .. }), None) => {
                if let Value::Object(item) = val {
                    object.extend(item);
                }
            }
            (Some(Context::Collection { items, .. }), Some(key)) => items.push(keyed(key, val)),
            (Some(Context::Collection { items, .. }), None) => items.push(val),
            (None, _) => (),
        }
    }

    fn finish(mut self) -> Value {
        while self.stack.len() > 1 {
            self.pop_context();
        }
        match self.stack.pop() {
            Some(Context::Object { object, .. }) => Value::Object(object),
            _ => Value::Null,
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

fn with_reporter(f: impl FnOnce(&mut Reporter)) {
    REPORTER.with(|reporter| {
        if let Some(r) = reporter.borrow_mut().as_mut() {
            f(r)
        }
    });
}

fn pop_context() {
    with_reporter(Reporter::pop_context);
}

#[must_use]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        pop_context();
    }
}

pub fn push_context(key: String) -> ContextGuard {
    with_reporter(|r| r.push(Context::Object { key: Some(key), object: Map::new() }));
    ContextGuard(())
}

#[must_use]
pub struct CollectionContextGuard(());

impl Drop for CollectionContextGuard {
    fn drop(&mut self) {
        pop_context();
    }
}

pub fn push_collection_context(key: String) -> CollectionContextGuard {
    with_reporter(|r| r.push(Context::Collection { key, items: Vec::new() }));
    CollectionContextGuard(())
}

impl CollectionContextGuard {
    pub fn push_collection_item(&mut self) -> CollectionItemContextGuard {
        with_reporter(|r| r.push(Context::Object { key: None, object: Map::new() }));
        CollectionItemContextGuard(self)
    }
}

#[must_use]
pub struct CollectionItemContextGuard<'a>(&'a CollectionContextGuard);

impl<'a> Drop for CollectionItemContextGuard<'a> {
    fn drop(&mut self) {
        pop_context();
    }
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    with_reporter(|r| r.report(key, val));
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { $crate::report::report($k.to_string(), $crate::report::json!($($json)+)) };
}

fn install_reporter() {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));
}

fn take_report() -> Option<Value> {
    REPORTER.with(|reporter| reporter.borrow_mut().take()).map(Reporter::finish)
}

#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        if let Some(report) = take_report() {
            println!("{}", report);
        }
    }
}

pub fn enable_reporting(program: &str) -> ReportingGuard {
    install_reporter();

    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_time", built_info::BUILT_TIME_UTC);
    report!("build_with_rustc", built_info::RUSTC_VERSION);

    if let Ok(output) = std::process::Command::new("hostname").output() {
        if let Ok(hostname) = String::from_utf8(output.stdout) {
            report!("hostname", hostname.trim());
        }
    }

    report!("program", program);
    report!("start_time", chrono::Utc::now().to_rfc2822());
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

pub mod benchmark;
pub use benchmark::*;
