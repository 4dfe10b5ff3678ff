use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use rayengine::{AppHandle, Application, EngineConfig, Layer, LayerId, LayerKey};

type Journal = Arc<Mutex<Vec<String>>>;

fn quiet_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.log.enabled = false;
    config.frame.yield_interval = Duration::ZERO;
    config
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn events(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

struct Recorder {
    name: String,
    journal: Journal,
    fail_attach: bool,
}

impl Recorder {
    fn boxed(name: &str, journal: &Journal) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
            fail_attach: false,
        })
    }

    fn record(&self, event: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{event}", self.name));
    }
}

impl Layer for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_attach(&mut self) -> anyhow::Result<()> {
        self.record("attach");
        if self.fail_attach {
            return Err(anyhow!("{} cannot attach", self.name));
        }
        Ok(())
    }

    fn on_detach(&mut self) -> anyhow::Result<()> {
        self.record("detach");
        Ok(())
    }

    fn on_update(&mut self, _delta_seconds: f32) -> anyhow::Result<()> {
        self.record("update");
        Ok(())
    }
}

#[test]
fn fifo_push_push_remove_leaves_second_layer() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let a = app.push_layer_async(Recorder::boxed("A", &j));
    app.push_layer_async(Recorder::boxed("B", &j));
    app.remove_layer_async(a);

    assert_eq!(app.apply_pending(), 3);
    assert_eq!(app.layer_stack().names(), ["B"]);
    assert!(!app.layer_stack().contains(a));
    assert_eq!(events(&j), ["A:attach", "B:attach", "A:detach"]);
}

#[test]
fn async_remove_by_name_adjusts_boundary() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    app.push_layer(Recorder::boxed("A", &j)).unwrap();
    assert_eq!(app.layer_stack().insertion_boundary(), 1);
    app.push_overlay(Recorder::boxed("B", &j)).unwrap();
    assert_eq!(app.layer_stack().len(), 2);
    assert_eq!(app.layer_stack().insertion_boundary(), 1);

    app.remove_layer_async("A");
    app.apply_pending();

    assert_eq!(app.layer_stack().names(), ["B"]);
    assert_eq!(app.layer_stack().insertion_boundary(), 0);
}

#[test]
fn remove_of_already_removed_layer_is_noop() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let a = app.push_layer(Recorder::boxed("A", &j)).unwrap();
    app.remove_layer_async(a);
    app.remove_layer_async(a);
    app.remove_layer_async("Missing");

    let stats = app.run_frame();
    assert_eq!(stats.applied_ops, 3);
    assert!(app.layer_stack().is_empty());
    assert_eq!(events(&j), ["A:attach", "A:detach"]);
}

struct Spawner {
    handle: AppHandle,
    journal: Journal,
    spawned: bool,
}

impl Layer for Spawner {
    fn name(&self) -> &str {
        "A"
    }

    fn on_update(&mut self, _delta_seconds: f32) -> anyhow::Result<()> {
        self.journal.lock().unwrap().push("A:update".into());
        if !self.spawned {
            self.spawned = true;
            self.handle
                .push_layer_async(Recorder::boxed("C", &self.journal));
        }
        Ok(())
    }
}

#[test]
fn push_from_update_lands_next_frame() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    app.push_layer(Box::new(Spawner {
        handle: app.handle(),
        journal: Arc::clone(&j),
        spawned: false,
    }))
    .unwrap();

    let first = app.run_frame();
    assert_eq!(first.updated_layers, 1);
    assert_eq!(app.layer_stack().names(), ["A"]);
    assert_eq!(app.pending_len(), 1);
    assert_eq!(events(&j), ["A:update"]);

    let second = app.run_frame();
    assert_eq!(second.applied_ops, 1);
    assert_eq!(second.updated_layers, 2);
    assert_eq!(app.layer_stack().names(), ["A", "C"]);
    assert_eq!(
        events(&j),
        ["A:update", "C:attach", "A:update", "C:update"]
    );
}

#[test]
fn pop_callback_runs_on_loop_thread_with_ownership() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let id = app.push_overlay_async(Recorder::boxed("Child", &j));
    let received: Arc<Mutex<Option<(String, thread::ThreadId)>>> = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&received);
    app.pop_layer_async(id, move |popped: Option<Box<dyn Layer>>| {
        let layer = popped.expect("child should be popped");
        *sink.lock().unwrap() = Some((layer.name().to_string(), thread::current().id()));
    });
    assert_eq!(app.pending_len(), 2);

    app.apply_pending();
    let received = received.lock().unwrap().clone();
    assert_eq!(received, Some(("Child".to_string(), thread::current().id())));
    assert!(app.layer_stack().is_empty());
    assert_eq!(events(&j), ["Child:attach", "Child:detach"]);
}

#[test]
fn pop_of_missing_layer_reports_none() {
    let mut app = Application::new(quiet_config());
    let result = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&result);
    app.pop_layer_async("Ghost", move |popped: Option<Box<dyn Layer>>| {
        sink.lock().unwrap().push(popped.is_none());
    });
    assert_eq!(app.pending_len(), 1);
    assert!(result.lock().unwrap().is_empty());

    app.apply_pending();
    assert_eq!(*result.lock().unwrap(), [true]);
}

#[test]
fn requests_from_pop_callback_wait_for_next_drain() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let id = app.push_layer(Recorder::boxed("Old", &j)).unwrap();
    let handle = app.handle();
    let callback_journal = Arc::clone(&j);
    app.pop_layer_async(id, move |popped: Option<Box<dyn Layer>>| {
        if popped.is_some() {
            handle.push_layer_async(Recorder::boxed("New", &callback_journal));
        }
    });

    assert_eq!(app.apply_pending(), 1);
    assert!(app.layer_stack().is_empty());
    assert_eq!(app.pending_len(), 1);

    assert_eq!(app.apply_pending(), 1);
    assert_eq!(app.layer_stack().names(), ["New"]);
}

#[test]
fn deferred_attach_failure_does_not_undo_later_requests() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let mut bad = Recorder::boxed("Bad", &j);
    bad.fail_attach = true;
    let bad_id = app.push_layer_async(bad);
    app.push_layer_async(Recorder::boxed("Good", &j));

    app.apply_pending();
    assert!(!app.layer_stack().contains(bad_id));
    assert_eq!(app.layer_stack().names(), ["Good"]);
    assert_eq!(app.layer_stack().insertion_boundary(), 1);
}

#[test]
fn popped_layer_is_no_longer_owned_by_stack() {
    let mut app = Application::new(quiet_config());
    let j = journal();
    let id = app.push_layer(Recorder::boxed("A", &j)).unwrap();
    let popped = app.layer_stack_mut().pop_layer(id);
    assert!(popped.is_some());
    assert!(!app.layer_stack().contains(LayerKey::from(id)));
    assert!(app.layer_stack_mut().pop_layer(id).is_none());
    assert!(!app.layer_stack_mut().remove_layer(id));
    assert!(!LayerId::NONE.is_issued());
}

#[test]
fn producers_on_many_threads_keep_per_thread_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let mut app = Application::new(quiet_config());
    let j = journal();
    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let handle = app.handle();
            let j = Arc::clone(&j);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    handle.push_overlay_async(Recorder::boxed(&format!("t{t}-{i}"), &j));
                }
            })
        })
        .collect();

    let mut applied = 0;
    while applied < THREADS * PER_THREAD {
        applied += app.run_frame().applied_ops;
        thread::yield_now();
    }
    for producer in producers {
        producer.join().unwrap();
    }
    applied += app.apply_pending();

    assert_eq!(applied, THREADS * PER_THREAD);
    assert_eq!(app.layer_stack().len(), THREADS * PER_THREAD);
    let names = app.layer_stack().names();
    for t in 0..THREADS {
        let prefix = format!("t{t}-");
        let order: Vec<usize> = names
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix))
            .map(|index| index.parse().unwrap())
            .collect();
        assert_eq!(order, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn dropping_application_detaches_remaining_layers() {
    let j = journal();
    {
        let mut app = Application::new(quiet_config());
        app.push_layer(Recorder::boxed("A", &j)).unwrap();
        app.push_overlay(Recorder::boxed("B", &j)).unwrap();
        app.push_layer_async(Recorder::boxed("Queued", &j));
    }
    assert_eq!(
        events(&j),
        ["A:attach", "B:attach", "A:detach", "B:detach"]
    );
}
