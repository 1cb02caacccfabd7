#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use anyhow::bail;
use docqa_core::{Document, DocumentSource, Inferencer, JobError, JobId};
use docqa_tasks::{Envelope, TaskObserver, TaskSupervisor};

pub const WAIT: Duration = Duration::from_secs(10);

/// Blocks a scripted worker until the test opens it.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let guard = self.open.lock().unwrap();
        let _ = self.cv.wait_timeout_while(guard, WAIT, |open| !*open).unwrap();
    }
}

#[derive(Clone)]
pub enum Page {
    Text(String),
    Fault(String),
    Panic(String),
}

pub fn text_pages(pages: &[&str]) -> Vec<Page> { pages.iter().map(|p| Page::Text(p.to_string())).collect() }

#[derive(Clone, Default)]
pub struct DocScript {
    pub pages: Vec<Page>,
    /// Held before the first page is read.
    pub gate: Option<Arc<Gate>>,
}

/// Documents keyed by path; unknown paths fail to open.
#[derive(Default)]
pub struct ScriptedSource {
    docs: HashMap<PathBuf, DocScript>,
}

impl ScriptedSource {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, path: &str, pages: Vec<Page>) -> Self {
        self.docs.insert(PathBuf::from(path), DocScript { pages, gate: None });
        self
    }

    pub fn gated(mut self, path: &str, pages: Vec<Page>, gate: &Arc<Gate>) -> Self {
        self.docs.insert(PathBuf::from(path), DocScript { pages, gate: Some(Arc::clone(gate)) });
        self
    }
}

struct ScriptedDocument(DocScript);

impl Document for ScriptedDocument {
    fn page_count(&self) -> usize { self.0.pages.len() }

    fn extract_page(&self, index: usize) -> anyhow::Result<String> {
        if index == 0 {
            if let Some(gate) = &self.0.gate { gate.wait(); }
        }
        match &self.0.pages[index] {
            Page::Text(text) => Ok(text.clone()),
            Page::Fault(msg) => bail!("{}", msg),
            Page::Panic(msg) => panic!("{}", msg),
        }
    }
}

impl DocumentSource for ScriptedSource {
    fn open(&self, path: &Path) -> anyhow::Result<Box<dyn Document>> {
        match self.docs.get(path) {
            Some(script) => Ok(Box::new(ScriptedDocument(script.clone()))),
            None => bail!("no such file"),
        }
    }
}

#[derive(Clone)]
pub enum Reply {
    Answer(String),
    Fault(String),
    Panic(String),
}

/// Answers keyed by question; unknown questions get `answer to <question>`.
#[derive(Default)]
pub struct ScriptedModel {
    replies: HashMap<String, (Reply, Option<Arc<Gate>>)>,
    pub calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, question: &str, reply: Reply) -> Self {
        self.replies.insert(question.to_string(), (reply, None));
        self
    }

    pub fn gated(mut self, question: &str, reply: Reply, gate: &Arc<Gate>) -> Self {
        self.replies.insert(question.to_string(), (reply, Some(Arc::clone(gate))));
        self
    }

    pub fn call_count(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl Inferencer for ScriptedModel {
    fn infer(&self, _context: &str, question: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((reply, gate)) = self.replies.get(question) else {
            return Ok(format!("answer to {}", question));
        };
        if let Some(gate) = gate { gate.wait(); }
        match reply {
            Reply::Answer(text) => Ok(text.clone()),
            Reply::Fault(msg) => bail!("{}", msg),
            Reply::Panic(msg) => panic!("{}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Progress(JobId, f32),
    Extracted(JobId, Result<String, JobError>),
    Answered(JobId, Result<String, JobError>),
}

#[derive(Default)]
pub struct Recorder {
    pub seen: Vec<Seen>,
}

impl Recorder {
    pub fn progress(&self) -> Vec<f32> {
        self.seen.iter().filter_map(|s| match s { Seen::Progress(_, f) => Some(*f), _ => None }).collect()
    }

    pub fn results(&self) -> Vec<&Seen> { self.seen.iter().filter(|s| !matches!(s, Seen::Progress(..))).collect() }
}

impl TaskObserver for Recorder {
    fn on_extraction_progress(&mut self, job: JobId, fraction: f32) { self.seen.push(Seen::Progress(job, fraction)); }
    fn on_extraction_result(&mut self, job: JobId, result: Result<String, JobError>) { self.seen.push(Seen::Extracted(job, result)); }
    fn on_inference_result(&mut self, job: JobId, result: Result<String, JobError>) { self.seen.push(Seen::Answered(job, result)); }
}

pub fn supervisor(source: ScriptedSource, model: ScriptedModel) -> (TaskSupervisor, Arc<ScriptedModel>) {
    let model = Arc::new(model);
    let sup = TaskSupervisor::new(tokio::runtime::Handle::current(), Arc::new(source), model.clone());
    (sup, model)
}

pub async fn next_envelope(sup: &mut TaskSupervisor) -> Envelope {
    tokio::time::timeout(WAIT, sup.recv()).await.expect("timed out waiting for a worker event").expect("queue closed")
}

/// Deliver events until `job` has produced its terminal event, whether or
/// not it was forwarded.
pub async fn run_until_terminal(sup: &mut TaskSupervisor, observer: &mut Recorder, job: JobId) {
    run_until_all_terminal(sup, observer, &[job]).await;
}

pub async fn run_until_all_terminal(sup: &mut TaskSupervisor, observer: &mut Recorder, jobs: &[JobId]) {
    let mut pending = jobs.to_vec();
    while !pending.is_empty() {
        let envelope = next_envelope(sup).await;
        if envelope.is_terminal() { pending.retain(|job| *job != envelope.job()); }
        sup.deliver(envelope, observer);
    }
}

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "progress {:?} vs {:?}", actual, expected);
    for (a, b) in actual.iter().zip(expected) {
        assert!((a - b).abs() < 1e-3, "progress {:?} vs {:?}", actual, expected);
    }
}
