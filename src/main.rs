// Allow unused code for designed-but-not-yet-used APIs
// Remove these as the codebase matures
#![allow(dead_code)]

mod config;
mod control;
mod display;
mod dissolve;
mod math3d;
mod mqtt;
mod pipes;
mod render3d;
mod util;

use config::{Config, JointMode};
use control::{Command, Controller};
use display::{Display, InputEvent, PixelBuffer, RenderTarget, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use dissolve::DissolveTransition;
use mqtt::MqttClient;
use pipes::{Bounds, PipeField};
use render3d::SceneRenderer;
use sdl2::keyboard::Keycode;
use util::{FpsCounter, Rng};

/// Scene background, also flashed for the single frame between dissolve
/// completion and the first fresh render
const BACKGROUND: (u8, u8, u8) = (5, 5, 12);

struct Args {
    width: u32,
    height: u32,
    vsync: bool,
    config_path: String,
    mqtt_host: Option<String>,
    mqtt_topic: String,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        vsync: true,
        config_path: "pipesaver.json".to_string(),
        mqtt_host: None,
        mqtt_topic: String::new(),
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--no-vsync" => args.vsync = false,
            "--width" | "-w" => {
                if i + 1 < argv.len() {
                    if let Ok(w) = argv[i + 1].parse::<u32>() {
                        args.width = w;
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < argv.len() {
                    if let Ok(h) = argv[i + 1].parse::<u32>() {
                        args.height = h;
                    }
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < argv.len() {
                    // Parse WxH format (e.g., 1920x1080)
                    let parts: Vec<&str> = argv[i + 1].split('x').collect();
                    if parts.len() == 2 {
                        if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                            args.width = w;
                            args.height = h;
                        }
                    }
                    i += 1;
                }
            },
            "--config" | "-c" => {
                if i + 1 < argv.len() {
                    args.config_path = argv[i + 1].clone();
                    i += 1;
                }
            },
            "--mqtt" => {
                if i + 1 < argv.len() {
                    args.mqtt_host = Some(argv[i + 1].clone());
                    i += 1;
                }
            },
            "--topic" => {
                if i + 1 < argv.len() {
                    args.mqtt_topic = argv[i + 1].clone();
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: pipesaver [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  --width W, -w W       Set window width (default: {})",
                    DEFAULT_WIDTH
                );
                println!(
                    "  --height H, -h H      Set window height (default: {})",
                    DEFAULT_HEIGHT
                );
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
                println!("  --config PATH, -c PATH    Config file (default: pipesaver.json)");
                println!("  --mqtt HOST           Receive config updates from an MQTT broker");
                println!("  --topic TOPIC         MQTT topic (default: pipesaver)");
                println!("  --no-vsync            Disable VSync for uncapped framerate");
                println!("  --help                Show this help message");
                std::process::exit(0);
            },
            _ => {},
        }
        i += 1;
    }

    args
}

fn load_config(path: &str) -> Config {
    if !std::path::Path::new(path).exists() {
        return Config::default();
    }
    match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {} (using defaults)", path, e);
            Config::default()
        }
    }
}

fn main() -> Result<(), String> {
    let args = parse_args();
    let config = load_config(&args.config_path);

    let (mut display, texture_creator) =
        Display::with_options("pipesaver", args.width, args.height, args.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, args.width, args.height)?;
    let mut buffer = PixelBuffer::with_size(args.width, args.height);
    let mut overlay = PixelBuffer::with_size(args.width, args.height);
    overlay.clear_rgba(0, 0, 0, 0);

    let mut renderer = SceneRenderer::new();
    let mut field = PipeField::new(Bounds::standard(), config, Rng::from_time());
    let mut dissolve = DissolveTransition::new(args.width, args.height, Rng::from_time());

    let controller = match Controller::new() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Control socket unavailable: {}", e);
            None
        }
    };

    let mqtt = match &args.mqtt_host {
        Some(host) => Some(MqttClient::new(host, &args.mqtt_topic)?),
        None => None,
    };

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut fps_print_timer = 0.0_f32;

    println!("=== pipesaver ===");
    println!("Resolution: {}x{}", args.width, args.height);
    if args.vsync {
        println!("VSync: ON (60fps locked). Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  Space      - Fast reset (dissolve + respawn)");
    println!("  R          - Slow reset");
    println!("  J          - Cycle joint mode (elbow/ball/mixed/cycle)");
    println!("  M          - Toggle multiple pipes per batch");
    println!("  S          - Save config to {}", args.config_path);
    println!("  F          - Toggle FPS logging");
    println!("  Escape     - Quit");
    if controller.is_some() {
        println!("Control socket: {}", Controller::socket_path());
    }

    'main: loop {
        // Delta time and FPS measurement
        let (dt, avg_fps) = fps_counter.tick();

        // A reset requested from any channel this frame; true means fast
        let mut reset_request: Option<bool> = None;

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::Space => reset_request = Some(true),
                    Keycode::R => reset_request = Some(false),
                    Keycode::J => {
                        let mut config = field.config().clone();
                        config.joints = match config.joints {
                            JointMode::Elbow => JointMode::Ball,
                            JointMode::Ball => JointMode::Mixed,
                            JointMode::Mixed => JointMode::Cycle,
                            JointMode::Cycle => JointMode::Elbow,
                        };
                        println!("Joint mode: {:?}", config.joints);
                        field.set_config(config);
                    },
                    Keycode::M => {
                        let mut config = field.config().clone();
                        config.multiple = !config.multiple;
                        println!("Multiple pipes: {}", config.multiple);
                        field.set_config(config);
                    },
                    Keycode::S => {
                        if let Err(e) = field.config().save(&args.config_path) {
                            eprintln!("Failed to save config: {}", e);
                        } else {
                            println!("Config saved to {}", args.config_path);
                        }
                    },
                    Keycode::F => show_fps = !show_fps,
                    _ => {},
                },
                InputEvent::Resize { width, height } => {
                    display.set_size(width, height);
                    target = RenderTarget::with_size(&texture_creator, width, height)?;
                    buffer = PixelBuffer::with_size(width, height);
                    overlay = PixelBuffer::with_size(width, height);
                    overlay.clear_rgba(0, 0, 0, 0);
                    dissolve.on_resize(width, height);
                    // Revealed tiles carry over onto the resized overlay
                    dissolve.repaint(&mut overlay);
                },
            }
        }

        if let Some(controller) = &controller {
            for cmd in controller.poll() {
                match cmd {
                    Command::Reset { fast } => reset_request = Some(fast),
                    Command::Joints(mode) => {
                        let mut config = field.config().clone();
                        config.joints = mode;
                        field.set_config(config);
                    },
                    Command::Multiple(on) => {
                        let mut config = field.config().clone();
                        config.multiple = on;
                        field.set_config(config);
                    },
                    Command::ToggleFps => show_fps = !show_fps,
                    Command::Quit => break 'main,
                }
            }
        }

        if let Some(mqtt) = &mqtt {
            for update in mqtt.poll() {
                match update.apply(field.config()) {
                    Ok(config) => field.set_config(config),
                    Err(e) => eprintln!("Rejected config update: {}", e),
                }
            }
        }

        // Reset scheduling: manual requests and the background timer both
        // funnel through the field's single-flight guard.
        let dissolve_seconds = match reset_request {
            Some(fast) => field.request_reset(fast),
            None => field.poll_reset_timer(dt),
        };
        if let Some(seconds) = dissolve_seconds {
            overlay.clear_rgba(0, 0, 0, 0);
            dissolve.start(seconds);
        }

        // Pipes keep growing during a dissolve; only rendering pauses
        field.tick(&mut renderer);
        renderer.update(dt);

        if !field.is_clearing() {
            renderer.render(&mut buffer);
        }

        if dissolve.advance(&mut overlay) {
            field.reset(&mut renderer);
            buffer.clear(BACKGROUND.0, BACKGROUND.1, BACKGROUND.2);
        }
        if dissolve.is_active() {
            buffer.composite_over(&overlay);
        }

        if show_fps {
            fps_print_timer += dt;
            if fps_print_timer >= 1.0 {
                fps_print_timer = 0.0;
                println!(
                    "FPS {:.0} avg ({:.1} ms), {} pipes, {} cells",
                    avg_fps,
                    fps_counter.avg_frame_time_ms(),
                    field.pipes().len(),
                    field.grid().len()
                );
            }
        }

        // Present
        display.present(&mut target, &buffer)?;
    }

    Ok(())
}
