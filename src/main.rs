use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec2;
use log::info;
use pollster::block_on;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{
    ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use lighthouse_beach::app::{self, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};
use lighthouse_beach::{
    AppConfig, OrbitGesture, PointerButton, PointerState, RenderLoop, Renderer, SceneContext,
    SystemClock,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = AppConfig::parse()?;
    let mut context = SceneContext::load(&config)?;
    app::print_summary(&context);

    if config.summary_only {
        run_headless(&mut context, &config)
    } else {
        match run_interactive(&mut context) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    run_headless(&mut context, &config)
                } else {
                    Err(err)
                }
            }
        }
    }
}

fn run_headless(context: &mut SceneContext, config: &AppConfig) -> Result<()> {
    app::print_texture_status(&context.textures);
    let draws = app::run_headless(context, config).context("headless run failed")?;
    app::print_final_state(context, &draws)
}

fn run_interactive(context: &mut SceneContext) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH as f64, WINDOW_HEIGHT as f64))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window)))
        .map_err(|err| WindowInitError::from_error("renderer", format!("{err:#}")))?;

    let mut app = AppState {
        renderer,
        context,
        render_loop: RenderLoop::new(SystemClock::new()),
        pointer: PointerState::new(),
        last_error: None,
    };
    app.resize(window.inner_size());
    app.render_loop.start();

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = app.process_event(&event) {
                app.last_error = Some(err);
                app.render_loop.stop();
            }
            if !app.render_loop.is_running() {
                elwt.exit();
            }
        })
        .context("event loop terminated abnormally")?;

    app.shutdown();

    if let Some(err) = app.last_error {
        return Err(err);
    }

    Ok(())
}

struct AppState<'a> {
    renderer: Renderer,
    context: &'a mut SceneContext,
    render_loop: RenderLoop<SystemClock>,
    pointer: PointerState,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

impl AppState<'_> {
    fn process_event(&mut self, event: &Event<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        self.render_loop.stop();
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key: Key::Named(NamedKey::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        self.render_loop.stop();
                    }
                    WindowEvent::Resized(size) => {
                        self.resize(*size);
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = self.renderer.window().inner_size();
                        self.resize(size);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        let gesture = self.pointer.move_to(pos);
                        self.apply_gesture(gesture);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        self.pointer.leave();
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(offset) => offset.y as f32 / 100.0,
                        };
                        let gesture = self.pointer.scroll(lines);
                        self.apply_gesture(gesture);
                    }
                    WindowEvent::RedrawRequested => {
                        self.render_loop.tick(self.context, &mut self.renderer)?;
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if self.render_loop.is_running() {
                    self.renderer.window().request_redraw();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let scale_factor = self.renderer.window().scale_factor();
        let logical = size.to_logical::<u32>(scale_factor);
        let state = self.context.viewport.resize(
            logical.width,
            logical.height,
            scale_factor,
            &mut self.context.camera,
            &mut self.renderer,
        );
        info!(
            "viewport {}x{} at pixel ratio {}",
            state.width, state.height, state.pixel_ratio
        );
    }

    fn apply_gesture(&mut self, gesture: Option<OrbitGesture>) {
        let Some(gesture) = gesture else {
            return;
        };
        let height = self.renderer.window().inner_size().height as f32;
        gesture.apply(&mut self.context.controls, &self.context.camera, height);
    }

    fn handle_mouse_button(&self, state: ElementState, button: MouseButton) {
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            MouseButton::Middle => PointerButton::Middle,
            _ => return,
        };
        match state {
            ElementState::Pressed => self.pointer.press(button),
            ElementState::Released => self.pointer.release(button),
        }
    }

    fn shutdown(&mut self) {
        self.render_loop.stop();
        println!("Rendered {} frame(s)", self.render_loop.frames());
    }
}
