//! `Room`: the scene.
//!
//! Owns the nodes, the camera, the injected renderer and (for physics rooms)
//! the injected physics world. Two frame-driven entry points:
//!
//! - [`Room::tick_animation`]: the animation loop; only does work while some
//!   node is animating, and reports when it has stopped.
//! - [`Room::frame`]: the render loop; runs every display frame regardless
//!   of animation state.
//!
//! All state is touched from one thread, one call at a time. A new query
//! overwrites in-flight targets; the next tick picks them up.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;

use crate::clock::FrameClock;
use crate::config::RoomConfig;
use crate::error::{Result, RoomError};
use crate::fast_math::{clamp01, Vec3};
use crate::metrics::{MetricsSnapshot, RoomMetrics};
use crate::net::embed::EmbeddingProvider;
use crate::net::retry::RetryPolicy;
use crate::node::{Node, NodeId};
use crate::physics::PhysicsWorld;
use crate::render::animator::{AnimationLoop, Tick, Transform};
use crate::render::camera::OrbitCamera;
use crate::render::layout::{plan_layout, NodeTarget};
use crate::render::sync::{read_physics, RenderSink, SceneSync};
use crate::render::DriveMode;
use crate::similarity::{rank, validate};

/// How many of the best matches are logged and reported per query.
const REPORT_TOP: usize = 5;

/// Notifications delivered to subscribers, synchronously and in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A population pass finished.
    Initialized { nodes: usize },
    NodeCreated { id: NodeId, label: Arc<str> },
    /// A plan was applied. `top` holds the best matches with their similarity.
    Replanned {
        top: Vec<(Arc<str>, f32)>,
        loop_started: bool,
    },
    /// The animation loop went idle.
    Settled,
    TornDown,
}

type Listener = Box<dyn FnMut(&RoomEvent) + Send>;

enum Source {
    Layout,
    Physics(Box<dyn PhysicsWorld>),
}

/// Targets for a query, keyed by node id so they survive node removal.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub targets: Vec<(NodeId, NodeTarget)>,
    pub average_similarity: f32,
}

/// What applying a plan did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    pub applied: usize,
    /// Targets whose node no longer exists
    pub skipped: usize,
    /// The animation loop was stopped and must be driven again
    pub loop_started: bool,
}

pub struct Room<R: RenderSink> {
    config: RoomConfig,
    nodes: Vec<Node>,
    by_label: HashMap<Arc<str>, NodeId>,
    slots: HashMap<NodeId, usize>,
    dimension: Option<usize>,
    next_id: u32,
    source: Source,
    camera: OrbitCamera,
    /// `None` once torn down
    renderer: Option<R>,
    sync: SceneSync,
    animation: AnimationLoop,
    listeners: Vec<Listener>,
    metrics: RoomMetrics,
}

impl<R: RenderSink> Room<R> {
    /// A similarity-layout room drawing into `renderer`.
    pub fn new(config: RoomConfig, renderer: R, aspect: f32) -> Self {
        Self::with_source(config, renderer, aspect, Source::Layout)
    }

    /// A room whose transforms come from `world`.
    pub fn with_physics(
        config: RoomConfig,
        renderer: R,
        aspect: f32,
        world: Box<dyn PhysicsWorld>,
    ) -> Self {
        Self::with_source(config, renderer, aspect, Source::Physics(world))
    }

    fn with_source(config: RoomConfig, renderer: R, aspect: f32, source: Source) -> Self {
        let camera = OrbitCamera::from_config(&config.camera, aspect);
        Self {
            config,
            nodes: Vec::new(),
            by_label: HashMap::new(),
            slots: HashMap::new(),
            dimension: None,
            next_id: 0,
            source,
            camera,
            renderer: Some(renderer),
            sync: SceneSync::new(),
            animation: AnimationLoop::new(),
            listeners: Vec::new(),
            metrics: RoomMetrics::default(),
        }
    }

    // ── Accessors ──

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn drive_mode(&self) -> DriveMode {
        match self.source {
            Source::Layout => DriveMode::Layout,
            Source::Physics(_) => DriveMode::Physics,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.by_label
            .get(label)
            .and_then(|id| self.slots.get(id))
            .map(|&slot| &self.nodes[slot])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Embedding dimensionality fixed by the first node.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }

    pub fn world(&self) -> Option<&dyn PhysicsWorld> {
        match &self.source {
            Source::Physics(world) => Some(&**world),
            Source::Layout => None,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.renderer.is_none()
    }

    /// True while the animation loop wants more ticks.
    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let animating = self.nodes.iter().filter(|n| n.is_animating()).count();
        self.metrics.snapshot(self.nodes.len(), animating)
    }

    /// Register a listener for [`RoomEvent`]s.
    pub fn subscribe(&mut self, listener: impl FnMut(&RoomEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: RoomEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_torn_down() {
            Err(RoomError::TornDown)
        } else {
            Ok(())
        }
    }

    // ── Population ──

    /// Add one node. Labels must be unique; embeddings must be non-zero and
    /// match the room's dimensionality.
    pub fn add_node(&mut self, label: &str, embedding: Vec<f32>, position: Vec3) -> Result<NodeId> {
        self.ensure_live()?;
        self.check_new(label, &embedding)?;
        Ok(self.insert_unchecked(label, embedding, position))
    }

    fn check_new(&self, label: &str, embedding: &[f32]) -> Result<()> {
        if self.by_label.contains_key(label) {
            return Err(RoomError::DuplicateNode(label.to_string()));
        }
        validate(embedding, self.dimension)
    }

    fn insert_unchecked(&mut self, label: &str, embedding: Vec<f32>, position: Vec3) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.dimension.get_or_insert(embedding.len());

        let node = Node::new(id, label, embedding, position);
        let label = Arc::clone(&node.label);
        self.slots.insert(id, self.nodes.len());
        self.by_label.insert(Arc::clone(&label), id);
        self.nodes.push(node);

        if let Source::Physics(world) = &mut self.source {
            world.spawn_body(id, position);
        }
        self.emit(RoomEvent::NodeCreated { id, label });
        id
    }

    /// Remove a node by label. In-flight plans that reference it skip it.
    pub fn remove_node(&mut self, label: &str) -> Option<Node> {
        let id = self.by_label.remove(label)?;
        let slot = self.slots.remove(&id)?;
        let node = self.nodes.remove(slot);
        for (i, n) in self.nodes.iter().enumerate().skip(slot) {
            self.slots.insert(n.id, i);
        }
        if let Source::Physics(world) = &mut self.source {
            world.remove_body(id);
        }
        if self.nodes.is_empty() {
            self.dimension = None;
        }
        Some(node)
    }

    /// Lay `entries` out on a square grid centred on the origin.
    ///
    /// All entries are validated before any is inserted, so a bad entry
    /// leaves the room unchanged.
    pub fn populate_grid<I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        self.ensure_live()?;
        let entries: Vec<(String, Vec<f32>)> = entries.into_iter().collect();

        let mut dimension = self.dimension;
        let mut seen = HashSet::new();
        for (label, embedding) in &entries {
            if self.by_label.contains_key(label.as_str()) || !seen.insert(label.as_str()) {
                return Err(RoomError::DuplicateNode(label.clone()));
            }
            validate(embedding, dimension)?;
            dimension.get_or_insert(embedding.len());
        }

        let positions = grid_positions(entries.len(), self.config.grid_spacing);
        let count = entries.len();
        for ((label, embedding), position) in entries.into_iter().zip(positions) {
            self.insert_unchecked(&label, embedding, position);
        }

        log::info!("Room populated: {} nodes ({} total)", count, self.nodes.len());
        self.emit(RoomEvent::Initialized { nodes: self.nodes.len() });
        Ok(count)
    }

    /// Embed `words` through `provider` and lay them out on the grid.
    pub fn populate_from_provider<P>(&mut self, provider: &P, words: &[&str]) -> Result<usize>
    where
        P: EmbeddingProvider + ?Sized,
    {
        self.ensure_live()?;
        let embedded = embed_words(provider, words, &self.config.init_retry);
        self.finish_population(embedded)
    }

    /// Lay out words embedded elsewhere (e.g. on a worker thread).
    ///
    /// An [`RoomError::Init`] failure is fatal: the room is torn down, which
    /// releases the renderer, before the error is returned. Other errors
    /// leave the room as it was.
    pub fn finish_population(
        &mut self,
        embedded: Result<Vec<(String, Vec<f32>)>>,
    ) -> Result<usize> {
        match embedded {
            Ok(entries) => self.populate_grid(entries),
            Err(e @ RoomError::Init { .. }) => {
                log::error!("Room initialization failed: {}", e);
                self.teardown();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // ── Search ──

    /// Rank every node against `query` and compute its targets.
    pub fn plan_query(&self, query: &[f32]) -> Result<QueryPlan> {
        self.ensure_live()?;
        if let Source::Physics(_) = self.source {
            return Err(RoomError::NotLayoutDriven);
        }
        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(RoomError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }
        let plan = plan_layout(query, &self.nodes, &self.config.layout)?;
        let average_similarity = plan.average_similarity();
        let targets = plan
            .targets
            .into_iter()
            .map(|t| (self.nodes[t.index].id, t))
            .collect();
        Ok(QueryPlan {
            targets,
            average_similarity,
        })
    }

    /// Retarget every node in `plan` from its current live transform.
    /// Colours change immediately; everything else animates.
    pub fn apply_plan(&mut self, plan: &QueryPlan, now_ms: f64) -> Result<QueryOutcome> {
        self.ensure_live()?;
        let mut applied = 0;
        let mut skipped = 0;
        let mut top = Vec::with_capacity(REPORT_TOP);

        for (id, target) in &plan.targets {
            let Some(&slot) = self.slots.get(id) else {
                log::debug!("Plan target {} no longer in room; skipped", id);
                skipped += 1;
                continue;
            };
            let node = &mut self.nodes[slot];
            node.color = target.color;
            let live = node.live;
            node.motion.retarget(
                &live,
                Transform {
                    position: target.position,
                    scale: target.scale,
                    opacity: target.opacity,
                    label_opacity: target.label_opacity,
                },
                target.similarity,
                now_ms,
                &self.config.animation,
            );
            applied += 1;
            if top.len() < REPORT_TOP {
                top.push((Arc::clone(&node.label), target.similarity));
            }
        }

        log::info!(
            "Top {} similar: {}",
            top.len(),
            top.iter()
                .map(|(label, s)| format!("{label} ({s:.3})"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.metrics.record_plan(plan.average_similarity);
        let loop_started = applied > 0 && self.animation.arm();
        self.emit(RoomEvent::Replanned { top, loop_started });

        Ok(QueryOutcome {
            applied,
            skipped,
            loop_started,
        })
    }

    /// [`plan_query`](Self::plan_query) then [`apply_plan`](Self::apply_plan).
    pub fn apply_query(&mut self, query: &[f32], now_ms: f64) -> Result<QueryOutcome> {
        let plan = self.plan_query(query)?;
        self.apply_plan(&plan, now_ms)
    }

    /// Embed `text` and apply it as a query. Provider failures leave the
    /// layout untouched.
    pub fn search<P>(&mut self, provider: &P, text: &str, now_ms: f64) -> Result<QueryOutcome>
    where
        P: EmbeddingProvider + ?Sized,
    {
        self.ensure_live()?;
        let embedding = provider.embed(text).map_err(|e| {
            log::warn!("Embedding failed for {:?}: {}", text, e);
            RoomError::from(e)
        })?;
        self.apply_query(&embedding, now_ms)
    }

    /// Physics rooms: push every body by `impulse`, scaled by its node's
    /// similarity to `query` (clamped to [0, 1]). Returns the number of
    /// bodies pushed.
    pub fn nudge(&mut self, query: &[f32], impulse: Vec3) -> Result<usize> {
        self.ensure_live()?;
        let Source::Physics(world) = &mut self.source else {
            return Err(RoomError::NotPhysicsDriven);
        };
        validate(query, self.dimension)?;
        let ranked = rank(query, &self.nodes)?;
        for scored in &ranked {
            world.apply_impulse(self.nodes[scored.index].id, impulse, clamp01(scored.similarity));
        }
        log::debug!("Nudged {} bodies", ranked.len());
        Ok(ranked.len())
    }

    // ── Frame-driven loops ──

    /// One animation tick. Returns [`Tick::Continue`] while another tick is
    /// wanted; once every node has settled the loop stops itself.
    pub fn tick_animation(&mut self, now_ms: f64) -> Tick {
        if self.is_torn_down() {
            return Tick::Stopped;
        }
        let tick = self.animation.tick(now_ms, &mut self.nodes);
        if tick == Tick::Settled {
            log::debug!("Animation settled after {} ticks", self.animation.ticks());
            self.emit(RoomEvent::Settled);
        }
        tick
    }

    /// One display frame: step physics (physics rooms), copy transforms into
    /// the render frame, billboard labels, render.
    pub fn frame(&mut self, now_ms: f64) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if let Source::Physics(world) = &mut self.source {
            world.step(self.config.physics.timestep);
            read_physics(&mut self.nodes, &**world);
        }
        self.sync.capture(&self.nodes, &self.camera);
        self.sync.present(renderer, &self.camera);
        self.metrics.record_frame(now_ms);
    }

    /// Animation tick (if running) followed by a frame, at `clock`'s time.
    pub fn pump(&mut self, clock: &dyn FrameClock) -> Tick {
        let now = clock.now_ms();
        let tick = self.tick_animation(now);
        self.frame(now);
        tick
    }

    /// Stop both loops, release the renderer, drop all nodes and listeners.
    /// Idempotent.
    pub fn teardown(&mut self) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        self.animation.stop();
        renderer.release();

        if let Source::Physics(world) = &mut self.source {
            for node in &self.nodes {
                world.remove_body(node.id);
            }
        }
        let count = self.nodes.len();
        self.nodes.clear();
        self.by_label.clear();
        self.slots.clear();
        self.dimension = None;

        log::info!("Room torn down ({} nodes released)", count);
        self.emit(RoomEvent::TornDown);
        self.listeners.clear();
    }
}

impl<R: RenderSink> Drop for Room<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Square grid of `n` points, `spacing` apart, centred on the origin at y = 0.
pub fn grid_positions(n: usize, spacing: f32) -> Vec<Vec3> {
    if n == 0 {
        return Vec::new();
    }
    let grid = (n as f64).sqrt().ceil() as usize;
    let offset = (grid - 1) as f32 * spacing * 0.5;
    (0..n)
        .map(|i| {
            let row = i / grid;
            let col = i % grid;
            [col as f32 * spacing - offset, 0.0, row as f32 * spacing - offset]
        })
        .collect()
}

/// Embed every word. The first request is polled with `retry` (the provider
/// may still be warming up); the rest run in parallel and fail on the first
/// error.
pub fn embed_words<P>(provider: &P, words: &[&str], retry: &RetryPolicy) -> Result<Vec<(String, Vec<f32>)>>
where
    P: EmbeddingProvider + ?Sized,
{
    let Some((first, rest)) = words.split_first() else {
        return Ok(Vec::new());
    };
    let head = retry.poll("embedding provider", |_| provider.embed(first))?;

    let tail = rest
        .par_iter()
        .map(|word| provider.embed(word).map(|e| (word.to_string(), e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(words.len());
    out.push((first.to_string(), head));
    out.extend(tail);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::net::embed::EmbedError;
    use crate::physics::BallWorld;
    use crate::render::camera::OrbitCamera;
    use crate::render::sync::RenderFrame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink {
        frames: usize,
        last: Option<RenderFrame>,
        released: Arc<AtomicUsize>,
    }

    impl RenderSink for Sink {
        fn render(&mut self, frame: &RenderFrame, _camera: &OrbitCamera) {
            self.frames += 1;
            self.last = Some(frame.clone());
        }
        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Embeds a few fixed words; anything else is a provider error.
    struct Table;

    impl EmbeddingProvider for Table {
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbedError> {
            match text {
                "x" => Ok(vec![1.0, 0.0, 0.0]),
                "y" => Ok(vec![0.0, 1.0, 0.0]),
                "xy" => Ok(vec![1.0, 1.0, 0.0]),
                "z" => Ok(vec![0.0, 0.0, 1.0]),
                other => Err(EmbedError::Provider {
                    text: other.to_string(),
                    message: "unknown word".to_string(),
                }),
            }
        }
    }

    fn config() -> RoomConfig {
        let mut cfg = RoomConfig::default();
        cfg.animation.duration_ms = 1000.0;
        cfg.init_retry = RetryPolicy { attempts: 2, interval_ms: 0 };
        cfg
    }

    fn room() -> Room<Sink> {
        let mut room = Room::new(config(), Sink::default(), 1.0);
        room.populate_grid(vec![
            ("node1".to_string(), vec![1.0, 0.0, 0.0]),
            ("node2".to_string(), vec![0.0, 1.0, 0.0]),
            ("node3".to_string(), vec![1.0, 1.0, 0.0]),
        ])
        .unwrap();
        room
    }

    #[test]
    fn grid_is_centred() {
        let p = grid_positions(4, 4.0);
        assert_eq!(p, vec![[-2.0, 0.0, -2.0], [2.0, 0.0, -2.0], [-2.0, 0.0, 2.0], [2.0, 0.0, 2.0]]);
        let p = grid_positions(5, 1.0);
        assert_eq!(p.len(), 5);
        assert_eq!(p[0], [-1.0, 0.0, -1.0]);
        assert_eq!(p[4], [0.0, 0.0, 0.0]);
        assert!(grid_positions(0, 1.0).is_empty());
        assert_eq!(grid_positions(1, 3.0), vec![[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn population_rejects_bad_entries_atomically() {
        let mut room = room();
        let err = room
            .populate_grid(vec![
                ("fresh".to_string(), vec![1.0, 2.0, 3.0]),
                ("node1".to_string(), vec![1.0, 2.0, 3.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, RoomError::DuplicateNode(ref l) if l == "node1"));
        assert!(room.node("fresh").is_none());

        let err = room
            .populate_grid(vec![("flat".to_string(), vec![1.0, 2.0])])
            .unwrap_err();
        assert!(matches!(err, RoomError::DimensionMismatch { expected: 3, actual: 2 }));

        assert!(matches!(
            room.add_node("void", vec![0.0, 0.0, 0.0], [0.0; 3]),
            Err(RoomError::ZeroNorm)
        ));
        assert_eq!(room.len(), 3);
    }

    #[test]
    fn query_ranks_and_animates_to_targets() {
        let mut room = room();
        let clock = ManualClock::new(0.0);
        let outcome = room.apply_query(&[1.0, 0.0, 0.0], clock.now_ms()).unwrap();
        assert_eq!(outcome, QueryOutcome { applied: 3, skipped: 0, loop_started: true });
        assert!(room.is_animating());

        let plan = room.plan_query(&[1.0, 0.0, 0.0]).unwrap();
        let labels: Vec<&str> = plan
            .targets
            .iter()
            .map(|(id, _)| &*room.nodes()[room.slots[id]].label)
            .collect();
        assert_eq!(labels, vec!["node1", "node3", "node2"]);

        let mut ticks = 0;
        loop {
            clock.advance(16.0);
            match room.pump(&clock) {
                Tick::Continue => ticks += 1,
                Tick::Settled => break,
                Tick::Stopped => panic!("loop stopped without settling"),
            }
            assert!(ticks < 1000);
        }
        assert!(!room.is_animating());
        for (id, target) in &plan.targets {
            let node = &room.nodes()[room.slots[id]];
            assert_eq!(node.live.position, target.position);
            assert_eq!(node.live.scale, target.scale);
            assert!(!node.is_animating());
        }

        // The render loop keeps running after the animation loop stops.
        let before = room.renderer().unwrap().frames;
        clock.advance(16.0);
        assert_eq!(room.pump(&clock), Tick::Stopped);
        assert_eq!(room.renderer().unwrap().frames, before + 1);
    }

    #[test]
    fn requery_mid_flight_continues_from_live_position() {
        let mut room = room();
        room.apply_query(&[1.0, 0.0, 0.0], 0.0).unwrap();
        room.tick_animation(400.0);
        let mid = room.node("node2").unwrap().live;

        let outcome = room.apply_query(&[0.0, 1.0, 0.0], 400.0).unwrap();
        assert!(!outcome.loop_started, "loop was still running");
        room.tick_animation(400.0);
        assert_eq!(room.node("node2").unwrap().live, mid);
    }

    #[test]
    fn loop_resumes_after_settling() {
        let mut room = room();
        room.apply_query(&[1.0, 0.0, 0.0], 0.0).unwrap();
        assert_eq!(room.tick_animation(5000.0), Tick::Settled);
        assert_eq!(room.tick_animation(5016.0), Tick::Stopped);

        let outcome = room.apply_query(&[0.0, 1.0, 0.0], 6000.0).unwrap();
        assert!(outcome.loop_started);
        assert_eq!(room.tick_animation(6100.0), Tick::Continue);
    }

    #[test]
    fn removed_node_is_skipped_when_plan_lands() {
        let mut room = room();
        let plan = room.plan_query(&[1.0, 0.0, 0.0]).unwrap();
        let removed = room.remove_node("node3").unwrap();
        assert_eq!(&*removed.label, "node3");

        let outcome = room.apply_plan(&plan, 0.0).unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped, 1);
        assert!(room.node("node2").unwrap().is_animating());
    }

    #[test]
    fn bad_queries_leave_layout_untouched() {
        let mut room = room();
        assert!(matches!(room.apply_query(&[0.0, 0.0, 0.0], 0.0), Err(RoomError::ZeroNorm)));
        assert!(matches!(
            room.apply_query(&[1.0, 0.0], 0.0),
            Err(RoomError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(room.search(&Table, "unknown", 0.0), Err(RoomError::Embed(_))));
        assert!(room.nodes().iter().all(|n| !n.is_animating()));
        assert!(!room.is_animating());
    }

    #[test]
    fn search_goes_through_provider() {
        let mut room = room();
        let outcome = room.search(&Table, "xy", 0.0).unwrap();
        assert_eq!(outcome.applied, 3);
        assert_eq!(room.metrics().animating_count, 3);
        assert!(room.metrics().average_similarity > 0.0);
    }

    #[test]
    fn colours_apply_immediately() {
        let mut room = room();
        let before = room.node("node1").unwrap().color;
        room.apply_query(&[1.0, 0.0, 0.0], 0.0).unwrap();
        let after = room.node("node1").unwrap().color;
        assert_ne!(before, after);
        assert_eq!(after, room.config().layout.target_color(1.0));
    }

    #[test]
    fn populate_from_provider_embeds_every_word() {
        let mut room = Room::new(config(), Sink::default(), 1.0);
        assert_eq!(room.populate_from_provider(&Table, &["x", "y", "z", "xy"]).unwrap(), 4);
        assert_eq!(room.dimension(), Some(3));
        assert!(!room.is_torn_down());

        let mut partial = Room::new(config(), Sink::default(), 1.0);
        assert!(matches!(
            partial.populate_from_provider(&Table, &["x", "bogus"]),
            Err(RoomError::Embed(EmbedError::Provider { .. }))
        ));
        assert!(partial.is_empty());
        assert!(!partial.is_torn_down());
    }

    #[test]
    fn failed_initialization_releases_renderer() {
        let released = Arc::new(AtomicUsize::new(0));
        let sink = Sink { released: Arc::clone(&released), ..Sink::default() };
        let mut room = Room::new(config(), sink, 1.0);

        match room.populate_from_provider(&Table, &["nope", "x"]) {
            Err(RoomError::Init { attempts, reason }) => {
                assert_eq!(attempts, 2);
                assert!(reason.contains("nope"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(room.is_torn_down());
        assert!(room.is_empty());
        assert!(!room.is_animating());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(matches!(
            room.populate_from_provider(&Table, &["x"]),
            Err(RoomError::TornDown)
        ));

        drop(room);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finish_population_keeps_room_on_data_errors() {
        let mut room = Room::new(config(), Sink::default(), 1.0);
        assert!(matches!(
            room.finish_population(Ok(vec![("flat".to_string(), vec![0.0, 0.0])])),
            Err(RoomError::ZeroNorm)
        ));
        assert!(!room.is_torn_down());
        assert_eq!(
            room.finish_population(Ok(vec![("a".to_string(), vec![1.0, 0.0])])).unwrap(),
            1
        );

        let err = RoomError::Init { attempts: 3, reason: "offline".to_string() };
        assert!(matches!(room.finish_population(Err(err)), Err(RoomError::Init { .. })));
        assert!(room.is_torn_down());
    }

    #[test]
    fn events_reach_subscribers_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut room = Room::new(config(), Sink::default(), 1.0);
        let sink = Arc::clone(&log);
        room.subscribe(move |e| {
            let tag = match e {
                RoomEvent::Initialized { .. } => "init",
                RoomEvent::NodeCreated { .. } => "node",
                RoomEvent::Replanned { .. } => "plan",
                RoomEvent::Settled => "settled",
                RoomEvent::TornDown => "down",
            };
            sink.lock().unwrap().push(tag);
        });
        room.populate_grid(vec![("a".to_string(), vec![1.0, 0.0]), ("b".to_string(), vec![0.0, 1.0])])
            .unwrap();
        room.apply_query(&[1.0, 0.0], 0.0).unwrap();
        room.tick_animation(10_000.0);
        room.teardown();
        room.teardown();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["node", "node", "init", "plan", "settled", "down"]
        );
    }

    #[test]
    fn teardown_releases_once_and_goes_inert() {
        let released = Arc::new(AtomicUsize::new(0));
        let sink = Sink { released: Arc::clone(&released), ..Sink::default() };
        let mut room = Room::new(config(), sink, 1.0);
        room.populate_grid(vec![("a".to_string(), vec![1.0])]).unwrap();
        room.apply_query(&[1.0], 0.0).unwrap();

        room.teardown();
        assert!(room.is_torn_down());
        assert!(!room.is_animating());
        assert!(room.is_empty());
        assert_eq!(room.tick_animation(100.0), Tick::Stopped);
        room.frame(100.0);
        assert!(matches!(room.apply_query(&[1.0], 0.0), Err(RoomError::TornDown)));
        assert!(matches!(room.add_node("b", vec![1.0], [0.0; 3]), Err(RoomError::TornDown)));

        drop(room);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_renderer() {
        let released = Arc::new(AtomicUsize::new(0));
        {
            let _room = Room::new(
                config(),
                Sink { released: Arc::clone(&released), ..Sink::default() },
                1.0,
            );
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn physics_room_syncs_bodies_and_refuses_queries() {
        let mut room = Room::with_physics(config(), Sink::default(), 1.0, Box::new(BallWorld::default()));
        assert_eq!(room.drive_mode(), DriveMode::Physics);
        let id = room.add_node("ball", vec![1.0, 0.0], [0.0, 5.0, 0.0]).unwrap();

        for i in 0..30 {
            room.frame(i as f64 * 16.0);
        }
        let node = room.node("ball").unwrap();
        assert!(node.live.position[1] < 5.0);
        let body = room.world().unwrap().body_transform(id).unwrap();
        assert_eq!(node.live.position, body.translation);

        let frame = room.renderer().unwrap().last.clone().unwrap();
        assert_eq!(frame.objects[0].position, body.translation);
        assert_eq!(frame.objects[0].rotation, body.rotation);

        assert!(matches!(room.apply_query(&[1.0, 0.0], 0.0), Err(RoomError::NotLayoutDriven)));

        room.remove_node("ball");
        assert!(room.world().unwrap().body_transform(id).is_none());
    }

    #[test]
    fn nudge_pushes_similar_bodies_harder() {
        let mut room = Room::with_physics(config(), Sink::default(), 1.0, Box::new(BallWorld::default()));
        let near = room.add_node("near", vec![1.0, 0.0], [0.0, 0.8, 0.0]).unwrap();
        let far = room.add_node("far", vec![0.0, 1.0], [5.0, 0.8, 0.0]).unwrap();

        assert_eq!(room.nudge(&[1.0, 0.0], [0.0, 50.0, 0.0]).unwrap(), 2);
        room.frame(0.0);
        let world = room.world().unwrap();
        let near_y = world.body_transform(near).unwrap().translation[1];
        let far_y = world.body_transform(far).unwrap().translation[1];
        assert!(near_y > 0.8, "{near_y}");
        assert!(near_y > far_y);

        assert!(matches!(
            room.nudge(&[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Err(RoomError::DimensionMismatch { expected: 2, actual: 3 })
        ));

        let mut layout = Room::new(config(), Sink::default(), 1.0);
        assert!(matches!(
            layout.nudge(&[1.0], [0.0, 1.0, 0.0]),
            Err(RoomError::NotPhysicsDriven)
        ));
    }

    #[test]
    fn metrics_count_frames() {
        let mut room = room();
        for i in 0..=60 {
            room.frame(i as f64 * 1000.0 / 60.0);
        }
        let m = room.metrics();
        assert_eq!(m.node_count, 3);
        assert_eq!(m.frames, 61);
        assert!(m.fps > 0.0);
    }
}
