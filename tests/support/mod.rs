//! Scripted stand-in for the external runtime tool.
#![allow(dead_code)]

use async_trait::async_trait;
use berth::api::{CliInvoker, Invocation};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub fn ok(stdout: &str) -> Invocation {
    Invocation {
        exit_code: Some(0),
        stdout: Some(stdout.to_string()),
        stderr: Some(String::new()),
        failed: false,
    }
}

pub fn fail(stderr: &str) -> Invocation {
    Invocation {
        exit_code: Some(1),
        stdout: Some(String::new()),
        stderr: Some(stderr.to_string()),
        failed: true,
    }
}

/// Responses are registered against an argv prefix (arguments joined with
/// spaces); the longest matching prefix wins. Each registered response is
/// consumed in order, and the final one is sticky so open-ended poll loops
/// keep observing the same state.
#[derive(Default)]
pub struct FakeInvoker {
    responses: Mutex<HashMap<String, VecDeque<Invocation>>>,
    calls: Mutex<Vec<String>>,
    privileged_calls: Mutex<Vec<String>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, prefix: &str, invocation: Invocation) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(prefix.to_string())
            .or_default()
            .push_back(invocation);
        self
    }

    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn privileged_calls_matching(&self, prefix: &str) -> usize {
        self.privileged_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn respond(&self, joined: &str) -> Invocation {
        let mut responses = self.responses.lock().unwrap();
        let key = responses
            .keys()
            .filter(|key| joined.starts_with(key.as_str()))
            .max_by_key(|key| key.len())
            .cloned();

        match key {
            Some(key) => {
                let queue = responses.get_mut(&key).unwrap();
                if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().cloned().unwrap()
                }
            }
            None => ok("[]"),
        }
    }
}

#[async_trait]
impl CliInvoker for FakeInvoker {
    async fn invoke(&self, args: &[&str]) -> Invocation {
        let joined = args.join(" ");
        self.calls.lock().unwrap().push(joined.clone());
        self.respond(&joined)
    }

    async fn invoke_privileged(&self, args: &[&str]) -> Invocation {
        let joined = args.join(" ");
        self.privileged_calls.lock().unwrap().push(joined.clone());
        self.respond(&joined)
    }
}
