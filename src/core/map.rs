//! The navigation context: one owner for the viewport, navigator, gesture
//! recognizer and the command queue other threads post into.

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::NavigationConfig;
use crate::core::geo::{GeoPoint, Point};
use crate::core::navigator::Navigator;
use crate::core::viewport::Viewport;
use crate::input::controller::GestureController;
use crate::input::events::{EventHandled, Gesture, GestureHandler, PointerEvent};
use crate::input::gestures::GestureRecognizer;
use crate::traits::TileRenderer;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Work posted to a [`Map`] from any thread and applied on its next tick
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    Pointer(PointerEvent),
    Resize {
        width: f64,
        height: f64,
    },
    MoveTo {
        target: GeoPoint,
        duration: Duration,
    },
    RotateTo {
        degrees: f64,
        pivot: Option<Point>,
        duration: Duration,
    },
    ScaleTo {
        scale: f64,
        pivot: Option<Point>,
        duration: Duration,
    },
    CancelAnimations,
}

/// Routes gestures to the user handler first and to the controller unless vetoed
struct Dispatch<'a> {
    user: Option<&'a mut Box<dyn GestureHandler + Send>>,
    controller: &'a mut GestureController,
    navigator: &'a mut Navigator,
}

impl GestureHandler for Dispatch<'_> {
    fn on_gesture(&mut self, gesture: &Gesture) -> EventHandled {
        log::trace!("gesture {}", gesture.name());
        if let Some(user) = self.user.as_mut() {
            if user.on_gesture(gesture).is_handled() {
                return EventHandled::Handled;
            }
        }
        self.controller.apply(gesture, self.navigator)
    }
}

pub struct Map {
    navigator: Navigator,
    recognizer: GestureRecognizer,
    controller: GestureController,
    handler: Option<Box<dyn GestureHandler + Send>>,
    commands_tx: Sender<MapCommand>,
    commands_rx: Receiver<MapCommand>,
}

impl Map {
    pub fn new(config: NavigationConfig, width: f64, height: f64) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock), width, height)
    }

    /// Map whose timers and animations follow `clock`
    pub fn with_clock(
        config: NavigationConfig,
        clock: Arc<dyn Clock>,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        config.validate()?;
        let controller = GestureController::new(Duration::from_millis(
            config.navigator.swipe_max_duration_ms,
        ));
        let recognizer = GestureRecognizer::with_config(config.gestures, Arc::clone(&clock));
        let navigator =
            Navigator::with_clock(config.viewport, config.navigator, clock, width, height);
        let (commands_tx, commands_rx) = unbounded();
        Ok(Self {
            navigator,
            recognizer,
            controller,
            handler: None,
            commands_tx,
            commands_rx,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        self.navigator.viewport()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn controller_mut(&mut self) -> &mut GestureController {
        &mut self.controller
    }

    /// Handle for posting commands from other threads
    pub fn commands(&self) -> Sender<MapCommand> {
        self.commands_tx.clone()
    }

    /// Installs a handler that sees every gesture before the default controller
    pub fn set_gesture_handler(&mut self, handler: impl GestureHandler + Send + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub fn clear_gesture_handler(&mut self) {
        self.handler = None;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.navigator.viewport_mut().size_changed(width, height);
    }

    /// Feeds one raw pointer event through the recognizer
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> EventHandled {
        let mut dispatch = Dispatch {
            user: self.handler.as_mut(),
            controller: &mut self.controller,
            navigator: &mut self.navigator,
        };
        self.recognizer.process(event, &mut dispatch)
    }

    fn apply(&mut self, command: MapCommand) {
        log::trace!("applying {:?}", command);
        match command {
            MapCommand::Pointer(event) => {
                self.handle_pointer(&event);
            }
            MapCommand::Resize { width, height } => self.resize(width, height),
            MapCommand::MoveTo { target, duration } => {
                self.navigator.move_to_geo(target, duration);
            }
            MapCommand::RotateTo {
                degrees,
                pivot,
                duration,
            } => {
                self.navigator.rotate_to(degrees, pivot, duration);
            }
            MapCommand::ScaleTo {
                scale,
                pivot,
                duration,
            } => {
                self.navigator.scale_to(scale, pivot, duration);
            }
            MapCommand::CancelAnimations => self.navigator.cancel_animations(),
        }
    }

    /// Runs one frame of navigation work.
    ///
    /// Drains posted commands, fires due gesture timers and advances
    /// animations. Returns whether the viewport needs to be redrawn.
    pub fn tick(&mut self) -> bool {
        while let Ok(command) = self.commands_rx.try_recv() {
            self.apply(command);
        }
        let mut dispatch = Dispatch {
            user: self.handler.as_mut(),
            controller: &mut self.controller,
            navigator: &mut self.navigator,
        };
        self.recognizer.tick(&mut dispatch);
        self.navigator.tick();
        self.viewport().needs_redraw()
    }

    /// Draws the visible tiles if anything changed since the last render
    pub fn render(&mut self, renderer: &mut dyn TileRenderer) -> bool {
        if !self.viewport().needs_redraw() {
            return false;
        }
        let snapshot = self.viewport().snapshot();
        renderer.begin_frame(&snapshot);
        for (tile, matrix) in &snapshot.tiles {
            renderer.draw_tile(*tile, matrix);
        }
        renderer.end_frame();
        self.navigator.viewport_mut().clear_redraw();
        log::trace!("rendered {} tiles", snapshot.tiles.len());
        true
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("navigator", &self.navigator)
            .field("recognizer", &self.recognizer)
            .field("has_handler", &self.handler.is_some())
            .field("queued_commands", &self.commands_rx.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::geo::TileIndex;
    use nalgebra::Matrix3;
    use std::sync::Mutex;

    fn map() -> (Map, ManualClock) {
        let clock = ManualClock::new();
        let map = Map::with_clock(
            NavigationConfig::default(),
            Arc::new(clock.clone()),
            512.0,
            512.0,
        )
        .unwrap();
        (map, clock)
    }

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        tiles: Vec<TileIndex>,
    }

    impl TileRenderer for CountingRenderer {
        fn begin_frame(&mut self, _snapshot: &crate::core::viewport::ViewportSnapshot) {
            self.frames += 1;
            self.tiles.clear();
        }

        fn draw_tile(&mut self, tile: TileIndex, _matrix: &Matrix3<f64>) {
            self.tiles.push(tile);
        }
    }

    #[test]
    fn test_render_only_when_dirty() {
        let (mut map, _) = map();
        let mut renderer = CountingRenderer::default();
        assert!(map.render(&mut renderer));
        assert_eq!(renderer.tiles, vec![TileIndex::new(0, 0, 0)]);
        assert!(!map.tick());
        assert!(!map.render(&mut renderer));
        assert_eq!(renderer.frames, 1);
    }

    #[test]
    fn test_commands_from_another_thread() {
        let (mut map, clock) = map();
        let sender = map.commands();
        std::thread::spawn(move || {
            sender
                .send(MapCommand::ScaleTo {
                    scale: 4.0,
                    pivot: None,
                    duration: Duration::from_millis(100),
                })
                .unwrap();
            sender
                .send(MapCommand::Resize {
                    width: 256.0,
                    height: 128.0,
                })
                .unwrap();
        })
        .join()
        .unwrap();

        assert!(map.tick());
        assert_eq!(map.viewport().width(), 256.0);
        clock.advance_ms(100);
        map.tick();
        assert_eq!(map.viewport().scale(), 4.0);
        assert!(!map.navigator().is_animating());
    }

    #[test]
    fn test_drag_moves_map() {
        let (mut map, clock) = map();
        map.navigator_mut().scale_to(8.0, None, Duration::ZERO);
        let grabbed = map.viewport().screen_to_view(Point::new(200.0, 200.0));
        map.handle_pointer(&PointerEvent::pressed(1, 200.0, 200.0));
        clock.advance_ms(16);
        map.handle_pointer(&PointerEvent::moved(1, 220.0, 200.0));
        clock.advance_ms(16);
        map.handle_pointer(&PointerEvent::moved(1, 240.0, 230.0));
        let under = map.viewport().screen_to_view(Point::new(240.0, 230.0));
        assert!(under.distance_to(&grabbed) < 1e-12);
    }

    #[test]
    fn test_user_handler_can_veto() {
        let (mut map, _) = map();
        map.navigator_mut().scale_to(8.0, None, Duration::ZERO);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        struct Blocker(Arc<Mutex<Vec<&'static str>>>);
        impl GestureHandler for Blocker {
            fn on_gesture(&mut self, gesture: &Gesture) -> EventHandled {
                self.0.lock().unwrap().push(gesture.name());
                match gesture {
                    Gesture::Panning(_) => EventHandled::Handled,
                    _ => EventHandled::NotHandled,
                }
            }
        }
        map.set_gesture_handler(Blocker(sink));
        let center = map.viewport().center();
        map.handle_pointer(&PointerEvent::pressed(1, 100.0, 100.0));
        map.handle_pointer(&PointerEvent::moved(1, 150.0, 100.0));
        assert_eq!(map.viewport().center(), center);
        assert!(seen.lock().unwrap().contains(&"panning"));
    }

    #[test]
    fn test_touch_down_cancels_animation() {
        let (mut map, clock) = map();
        map.navigator_mut()
            .move_to_geo(GeoPoint::new(10.0, 10.0), Duration::from_millis(500));
        clock.advance_ms(100);
        map.tick();
        assert!(map.navigator().is_animating());
        map.handle_pointer(&PointerEvent::pressed(1, 10.0, 10.0));
        assert!(!map.navigator().is_animating());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = NavigationConfig::default();
        config.viewport.min_zoom_level = 20;
        config.viewport.max_zoom_level = 2;
        assert!(Map::new(config, 100.0, 100.0).is_err());
    }
}
