//! Frame loop plumbing without a window.
//!
//! A [`Harness`] owns the shared [`Context`] and the callbacks registered
//! against it. Whoever drives the display (a winit event loop, a headless
//! test, a timer) calls [`Harness::frame`] once per frame and forwards key
//! presses to [`Harness::key`].
//!
//! ```
//! use tessera::Harness;
//!
//! let mut harness = Harness::new(640, 480, 0u32);
//! harness.register_update(|ctx, _dt| ctx.user_data += 1);
//! harness.register_key(|ctx, key, _x, _y| {
//!     if key == '\x1b' {
//!         ctx.request_exit();
//!     }
//! });
//!
//! let stats = harness.run(5.0, || 1.0 / 60.0);
//! assert_eq!(stats.frames, harness.context().user_data as u64);
//! ```

type DrawFn<U> = Box<dyn FnMut(&mut Context<U>)>;
type UpdateFn<U> = Box<dyn FnMut(&mut Context<U>, f32)>;
type KeyFn<U> = Box<dyn FnMut(&mut Context<U>, char, i32, i32)>;

/// State shared with every callback.
#[derive(Debug, Clone)]
pub struct Context<U> {
    pub width: u32,
    pub height: u32,
    pub user_data: U,
    frame: u64,
    elapsed: f32,
    exit_requested: bool,
}

impl<U> Context<U> {
    /// Width over height, or 1.0 while the target has no height.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Frames started so far, counting the current one.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds accumulated from the frame deltas.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

/// Summary of a [`Harness::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub elapsed: f32,
}

impl RunStats {
    pub fn frame_rate(&self) -> f32 {
        if self.elapsed > 0.0 {
            self.frames as f32 / self.elapsed
        } else {
            0.0
        }
    }
}

pub struct Harness<U> {
    context: Context<U>,
    draw: Option<DrawFn<U>>,
    update: Option<UpdateFn<U>>,
    key: Option<KeyFn<U>>,
}

impl<U> Harness<U> {
    pub fn new(width: u32, height: u32, user_data: U) -> Self {
        Self {
            context: Context {
                width,
                height,
                user_data,
                frame: 0,
                elapsed: 0.0,
                exit_requested: false,
            },
            draw: None,
            update: None,
            key: None,
        }
    }

    pub fn context(&self) -> &Context<U> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context<U> {
        &mut self.context
    }

    pub fn aspect(&self) -> f32 {
        self.context.aspect()
    }

    /// Replaces the draw callback.
    pub fn register_draw(&mut self, draw: impl FnMut(&mut Context<U>) + 'static) {
        self.draw = Some(Box::new(draw));
    }

    /// Replaces the update callback. It receives the frame delta in seconds.
    pub fn register_update(&mut self, update: impl FnMut(&mut Context<U>, f32) + 'static) {
        self.update = Some(Box::new(update));
    }

    /// Replaces the key callback. It receives the key and the pointer position.
    pub fn register_key(&mut self, key: impl FnMut(&mut Context<U>, char, i32, i32) + 'static) {
        self.key = Some(Box::new(key));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.width = width;
        self.context.height = height;
    }

    /// Runs one frame: update with `dt`, then draw.
    pub fn frame(&mut self, dt: f32) {
        self.context.frame += 1;
        self.context.elapsed += dt;
        if let Some(update) = self.update.as_mut() {
            update(&mut self.context, dt);
        }
        if let Some(draw) = self.draw.as_mut() {
            draw(&mut self.context);
        }
    }

    /// Forwards a key press to the key callback, if any.
    pub fn key(&mut self, key: char, x: i32, y: i32) {
        if let Some(handler) = self.key.as_mut() {
            handler(&mut self.context, key, x, y);
        }
    }

    /// Runs frames until `period` seconds have elapsed or a callback asks to
    /// exit. `next_delta` supplies each frame's delta.
    pub fn run(&mut self, period: f32, mut next_delta: impl FnMut() -> f32) -> RunStats {
        let start_frame = self.context.frame;
        let start_elapsed = self.context.elapsed;

        while !self.context.exit_requested && self.context.elapsed - start_elapsed < period {
            self.frame(next_delta());
        }

        let stats = RunStats {
            frames: self.context.frame - start_frame,
            elapsed: self.context.elapsed - start_elapsed,
        };
        log::info!(
            "stopped after {} frames in {:.3}s ({:.1} Hz)",
            stats.frames,
            stats.elapsed,
            stats.frame_rate()
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn update_runs_before_draw() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut harness = Harness::new(800, 600, ());

        let log = order.clone();
        harness.register_draw(move |ctx| log.borrow_mut().push(("draw", ctx.frame())));
        let log = order.clone();
        harness.register_update(move |ctx, _| log.borrow_mut().push(("update", ctx.frame())));

        harness.frame(0.016);
        harness.frame(0.016);

        assert_eq!(
            *order.borrow(),
            vec![("update", 1), ("draw", 1), ("update", 2), ("draw", 2)]
        );
        assert!((harness.context().elapsed() - 0.032).abs() < 1e-6);
    }

    #[test]
    fn frame_without_callbacks_only_counts() {
        let mut harness = Harness::new(1, 1, 7);
        harness.frame(0.5);
        harness.key('a', 0, 0);
        assert_eq!(harness.context().frame(), 1);
        assert_eq!(harness.context().user_data, 7);
    }

    #[test]
    fn key_reaches_callback() {
        let mut harness = Harness::new(800, 600, Vec::new());
        harness.register_key(|ctx, key, x, y| ctx.user_data.push((key, x, y)));
        harness.key('q', 3, 4);
        assert_eq!(harness.context().user_data, vec![('q', 3, 4)]);
    }

    #[test]
    fn aspect_follows_size() {
        let mut harness = Harness::new(1920, 1080, ());
        assert!((harness.aspect() - 16.0 / 9.0).abs() < 1e-6);
        harness.resize(100, 0);
        assert_eq!(harness.aspect(), 1.0);
    }

    #[test]
    fn run_stops_at_period() {
        let mut harness = Harness::new(800, 600, ());
        let stats = harness.run(1.0, || 0.25);
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.elapsed, 1.0);
        assert_eq!(stats.frame_rate(), 4.0);
    }

    #[test]
    fn run_stops_on_exit_request() {
        let mut harness = Harness::new(800, 600, ());
        harness.register_update(|ctx, _| {
            if ctx.frame() == 3 {
                ctx.request_exit();
            }
        });
        let stats = harness.run(100.0, || 0.1);
        assert_eq!(stats.frames, 3);
        assert!(harness.context().exit_requested());
    }
}
