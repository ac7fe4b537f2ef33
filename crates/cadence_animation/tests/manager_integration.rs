//! Integration tests for the tween manager driving tweens, sequences and graphs
//!
//! These tests verify that:
//! - Jobs complete on the exact tick their time runs out and are recycled
//! - Sequences start deferred tweens with state captured at trigger time
//! - Graph runners wait on manager-owned jobs and honor joins
//! - Owner invalidation and configuration apply to every job kind

use cadence_animation::{
    Accessor, Channel, Easing, GraphBuilder, Handle, Lifeline, LoopMode, ManagerConfig, Rgba,
    SequenceItem, Tween, TweenError, TweenManager, TweenSettings,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn log_to(log: &Log, name: &'static str) -> impl FnMut() + 'static {
    let log = log.clone();
    move || log.borrow_mut().push(name)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A two second tween ticked in half seconds finishes on the fourth tick
#[test]
fn test_tween_completes_on_fourth_tick() {
    let manager = TweenManager::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let done_at = Rc::new(Cell::new(0));

    let sink = seen.clone();
    let done = done_at.clone();
    let ticks = Rc::new(Cell::new(0));
    let tick_count = ticks.clone();
    manager
        .tween_value(0.0f32, 1.0, 2.0)
        .unwrap()
        .on_update(move |v| sink.borrow_mut().push(v))
        .on_complete(move || done.set(tick_count.get()));

    for i in 1..=5 {
        ticks.set(i);
        manager.tick(0.5);
    }

    assert_eq!(done_at.get(), 4);
    assert_eq!(*seen.borrow(), vec![0.25, 0.5, 0.75, 1.0]);
    assert_eq!(manager.active_count(), 0);
}

/// Pool identity holds through the manager for every job kind
#[test]
fn test_cancel_then_acquire_returns_same_instance() {
    let manager = TweenManager::default();

    let tween = manager.tween::<f32>().unwrap();
    manager.cancel(&tween, false);
    assert!(manager.tween::<f32>().unwrap().ptr_eq(&tween));

    let seq = manager.sequence().unwrap();
    manager.cancel(&seq, false);
    assert!(manager.sequence().unwrap().ptr_eq(&seq));
}

/// One large delta fires every skipped callback in order
#[test]
fn test_sequence_single_large_tick() {
    let manager = TweenManager::default();
    let log: Log = Default::default();
    manager
        .sequence()
        .unwrap()
        .add_delay(1.0)
        .add_callback(log_to(&log, "c1"))
        .add_delay(1.0)
        .add_callback(log_to(&log, "c2"));

    manager.tick(3.0);
    assert_eq!(*log.borrow(), vec!["c1", "c2"]);
    assert_eq!(manager.active_count(), 0);
}

/// Deferred items read live state when the playhead reaches them
#[test]
fn test_sequence_builds_tweens_at_trigger_time() {
    let manager = TweenManager::default();
    let x = Rc::new(Cell::new(0.0f32));
    let starts = Rc::new(RefCell::new(Vec::new()));

    let item = |to: f32| {
        let weak = manager.handle();
        let x = x.clone();
        let starts = starts.clone();
        move || -> cadence_animation::Result<Handle<Tween<f32>>> {
            starts.borrow_mut().push(x.get());
            let target = x.clone();
            Ok(weak
                .get()?
                .tween::<f32>()?
                .from(x.get())
                .to(to)
                .on_update(move |v| target.set(v)))
        }
    };

    manager
        .sequence()
        .unwrap()
        .add(item(10.0), 1.0, 0.0, false)
        .add(item(20.0), 1.0, 0.0, false);

    for _ in 0..4 {
        manager.tick(0.25);
    }
    assert_eq!(*starts.borrow(), vec![0.0, 5.0]);

    for _ in 0..8 {
        manager.tick(0.25);
    }
    assert_eq!(x.get(), 20.0);
    assert_eq!(manager.active_count(), 0);
}

/// Settings applied to deferred tweens shape their timing
#[test]
fn test_sequence_with_settings() {
    let manager = TweenManager::default();
    let weak = manager.handle();
    let x = Rc::new(Cell::new(0.0f32));
    let target = x.clone();
    let settings = TweenSettings::new(1.0).with_easing(Easing::EaseInQuad);

    manager.sequence().unwrap().add_with_settings(
        move || {
            let target = target.clone();
            Ok(weak
                .get()?
                .tween_value(0.0f32, 100.0, 0.0)?
                .on_update(move |v| target.set(v)))
        },
        settings,
        false,
    );

    // Trigger, then half of the tween's second
    manager.tick(0.1);
    manager.tick(0.5);
    assert!((x.get() - 25.0).abs() < 1e-3);
}

/// Overlay items start together and don't lengthen the timeline
#[test]
fn test_overlay_jobs_run_in_parallel() {
    let manager = TweenManager::default();
    let a = manager.tween_value(0.0f32, 1.0, 1.0).unwrap();
    let b = manager.tween_value(0.0f32, 1.0, 1.0).unwrap();
    let seq = manager
        .sequence()
        .unwrap()
        .add_now(&a, false)
        .add_now(&b, true);

    assert_eq!(seq.total_duration(), 1.0);
    manager.tick(0.1);
    assert!(!a.is_paused());
    assert!(!b.is_paused());
}

/// A graph waits for a manager job, then joins two branches
#[test]
fn test_graph_waits_on_jobs_and_joins() {
    init_tracing();
    let manager = TweenManager::default();
    let weak = manager.handle();
    let log: Log = Default::default();

    let graph = GraphBuilder::new()
        .invoke(log_to(&log, "start"))
        .job(move || weak.get()?.tween_value(0.0f32, 1.0, 1.0))
        .fork(vec![
            GraphBuilder::new().delay(0.5).invoke(log_to(&log, "short")),
            GraphBuilder::new().delay(1.5).invoke(log_to(&log, "long")),
        ])
        .join()
        .invoke(log_to(&log, "joined"))
        .build()
        .unwrap();

    let runner = manager.run_graph(graph, None).unwrap();
    assert_eq!(*log.borrow(), vec!["start"]);
    assert_eq!(manager.active_count(), 2);

    // The tween finishes; the runner notices on the following tick
    manager.tick(0.5);
    manager.tick(0.5);
    manager.tick(0.0);
    assert_eq!(*log.borrow(), vec!["start"]);

    manager.tick(0.5);
    assert_eq!(*log.borrow(), vec!["start", "short"]);
    assert!(runner.is_running());

    manager.tick(1.0);
    assert_eq!(*log.borrow(), vec!["start", "short", "long", "joined"]);
    assert_eq!(manager.active_count(), 0);
}

/// Running a graph that is already running is refused
#[test]
fn test_graph_rerun_is_refused() {
    let manager = TweenManager::default();
    let graph = GraphBuilder::new().delay(1.0).build().unwrap();
    let runner = manager.run_graph(graph, None).unwrap();
    assert!(matches!(runner.run(), Err(TweenError::AlreadyRunning)));
}

/// Destroying an owner stops every job attached to it or its parts
#[test]
fn test_owner_destroyed_mid_sequence() {
    let manager = TweenManager::default();
    let owner = Lifeline::new();
    let log: Log = Default::default();

    manager
        .sequence_owned(&owner)
        .unwrap()
        .add_item(SequenceItem::wait(1.0).with_trigger(log_to(&log, "a")))
        .add_item(SequenceItem::wait(1.0).with_trigger(log_to(&log, "b")))
        .on_complete(log_to(&log, "done"));
    let graph = GraphBuilder::new().delay(5.0).build().unwrap();
    manager.run_graph(graph, Some(&owner.part())).unwrap();

    manager.tick(0.5);
    assert_eq!(*log.borrow(), vec!["a"]);
    assert_eq!(manager.active_count(), 2);

    drop(owner);
    manager.tick(1.0);
    assert_eq!(*log.borrow(), vec!["a"]);
    assert_eq!(manager.active_count(), 0);
}

/// A looping sequence re-fires its items every pass
#[test]
fn test_looping_sequence_through_manager() {
    let manager = TweenManager::default();
    let count = Rc::new(Cell::new(0));
    let hits = count.clone();
    manager
        .sequence()
        .unwrap()
        .add_item(SequenceItem::wait(1.0).with_trigger(move || hits.set(hits.get() + 1)))
        .looping(LoopMode::Loop, Some(3));

    for _ in 0..6 {
        manager.tick(0.5);
    }
    assert_eq!(count.get(), 3);
    assert_eq!(manager.active_count(), 0);
}

struct Swatch {
    color: Cell<Rgba>,
}

/// A single-channel tween leaves the other channels alone
#[test]
fn test_channel_tween_with_owner_part() {
    let manager = TweenManager::default();
    let owner = Lifeline::new();
    let swatch = Rc::new(Swatch {
        color: Cell::new(Rgba::rgb(1.0, 0.5, 0.0)),
    });
    let alpha = Accessor::new(|s: &Swatch| s.color.get(), |s: &Swatch, c| s.color.set(c))
        .part(Channel::A);

    manager
        .tween_property(&swatch, alpha, 0.0, 1.0, Some(&owner.part()))
        .unwrap();
    manager.tick(0.5);
    assert_eq!(swatch.color.get(), Rgba::new(1.0, 0.5, 0.0, 0.5));

    manager.cancel_owner(&owner, false);
    assert_eq!(swatch.color.get(), Rgba::new(1.0, 0.5, 0.0, 0.0));
}

/// Configuration loaded from TOML caps the job count
#[test]
fn test_manager_from_toml_config() {
    let config = ManagerConfig::from_toml_str(
        r#"
        max_jobs = 1
        time_scale = 2.0
        "#,
    )
    .unwrap();
    let manager = TweenManager::new(config);

    let tween = manager.tween_value(0.0f32, 1.0, 1.0).unwrap();
    assert!(matches!(
        manager.tween::<f32>(),
        Err(TweenError::CapacityExceeded { max: 1 })
    ));

    manager.tick(0.5);
    assert!(!tween.is_current());
    assert!(manager.tween::<f32>().is_ok());
}
