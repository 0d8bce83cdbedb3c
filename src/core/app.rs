//! Entry points: the interactive session and one-shot commands

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::controller::Controller;
use crate::camera::{GstCamera, VideoSource, detect_cameras};
use crate::capture::DecodeResult;
use crate::capture::image::{acquire_from_file, pick_file};
use crate::cli::{Cli, Command};
use crate::config::QrPeekConfig;
use crate::present::{Presentation, Surface, TerminalSurface};
use crate::render::Canvas;

const HELP: &str = "\
Commands:
  open [PATH]   select an image (opens a file dialog without PATH)
  decode        decode the selected image
  camera        start or stop the camera
  capture       decode the current camera frame
  save [PATH]   save the displayed image as PNG
  help          show this help
  quit          exit";

/// One line typed into the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(Option<PathBuf>),
    Decode,
    Camera,
    Capture,
    Save(Option<PathBuf>),
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let path = || (!rest.is_empty()).then(|| PathBuf::from(rest));

        match word.to_ascii_lowercase().as_str() {
            "open" | "o" => Ok(SessionCommand::Open(path())),
            "decode" | "d" => Ok(SessionCommand::Decode),
            "camera" | "cam" | "c" => Ok(SessionCommand::Camera),
            "capture" | "snap" | "s" => Ok(SessionCommand::Capture),
            "save" => Ok(SessionCommand::Save(path())),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
            other => Err(format!("Unknown command '{}'. Type `help` for a list.", other)),
        }
    }
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => QrPeekConfig::load_from(path)?,
        None => {
            let config = QrPeekConfig::load();
            // Leave an editable file behind on first run
            if QrPeekConfig::path().is_some_and(|path| !path.exists()) {
                config.save();
            }
            config
        }
    };
    cli.apply(&mut config);
    log::debug!("Effective config: {:?}", config);

    match cli.command {
        None => {
            run_interactive(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Decode {
            file,
            annotate,
            json,
        }) => {
            let mut controller = Controller::new(&config, GstCamera::new(), surface(&config, json));
            let result = controller.decode_file(&file).await;
            finish_one_shot(&controller, &result, annotate, json)
        }
        Some(Command::Camera { annotate, json }) => {
            let mut controller = Controller::new(&config, GstCamera::new(), surface(&config, json));
            let result = controller.capture_once().await;
            finish_one_shot(&controller, &result, annotate, json)
        }
        Some(Command::Preview { file, out }) => {
            let buffer = acquire_from_file(&file).await?;
            let mut canvas = Canvas::placeholder();
            canvas.show(&buffer);
            canvas.save_png(&out)?;
            println!("Preview saved to {}", out.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Devices) => {
            let cameras = detect_cameras()?;
            if cameras.is_empty() {
                println!("No cameras found");
            }
            for camera in cameras {
                println!("{}", camera.info.display_name());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn surface(config: &QrPeekConfig, json: bool) -> TerminalSurface<std::io::Stdout> {
    let surface = TerminalSurface::stdout(config.hyperlinks);
    if json { surface.quiet() } else { surface }
}

fn finish_one_shot<S: VideoSource, U: Surface>(
    controller: &Controller<S, U>,
    result: &DecodeResult,
    annotate: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    if let Some(path) = annotate {
        controller.save_canvas(&path)?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(exit_code(result))
}

/// 0 when a code was decoded, 1 when none was found, 2 on error
pub fn exit_code(result: &DecodeResult) -> ExitCode {
    match result {
        DecodeResult::Found { .. } => ExitCode::SUCCESS,
        DecodeResult::NotFound => ExitCode::from(1),
        DecodeResult::Error { .. } => ExitCode::from(2),
    }
}

/// Read commands from stdin until `quit`, end of input or Ctrl-C
async fn run_interactive(config: &QrPeekConfig) -> Result<()> {
    let mut controller = Controller::new(
        config,
        GstCamera::new(),
        TerminalSurface::stdout(config.hyperlinks),
    );
    controller.surface_mut().show(&Presentation::status(HELP));

    let input = BufReader::new(tokio::io::stdin());
    run_session(&mut controller, input, tokio::signal::ctrl_c).await
}

/// Drive the controller from `input` line by line
///
/// `interrupt` is raced against both reading a command and running it, so an
/// interrupt also ends a camera start that never completes. The controller is
/// shut down however the loop ends.
async fn run_session<S, W, R, I, F>(
    controller: &mut Controller<S, TerminalSurface<W>>,
    input: R,
    mut interrupt: I,
) -> Result<()>
where
    S: VideoSource,
    W: Write,
    R: AsyncBufRead + Unpin,
    I: FnMut() -> F,
    F: Future,
{
    let mut lines = input.lines();
    let outcome = loop {
        controller.surface_mut().write_prompt();
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read command"),
            _ = interrupt() => Ok(None),
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<SessionCommand>() {
            Ok(SessionCommand::Quit) => break Ok(()),
            Ok(command) => {
                let interrupted = tokio::select! {
                    _ = execute(&mut *controller, command) => false,
                    _ = interrupt() => true,
                };
                if interrupted {
                    log::info!("Interrupted while running a command");
                    break Ok(());
                }
            }
            Err(message) => controller.surface_mut().show(&Presentation::status(message)),
        }
    };

    controller.shutdown();
    log::debug!("Session ended; camera {:?}", controller.camera_phase());
    outcome
}

/// Apply one session command to the controller
pub async fn execute<S: VideoSource, U: Surface>(
    controller: &mut Controller<S, U>,
    command: SessionCommand,
) {
    match command {
        SessionCommand::Open(path) => {
            let path = match path {
                Some(path) => Some(path),
                None => pick_file().await,
            };
            controller.select_file(path).await;
        }
        SessionCommand::Decode => {
            controller.decode_selected().await;
        }
        SessionCommand::Camera => {
            // The outcome is already on the surface
            let _ = controller.toggle_camera().await;
        }
        SessionCommand::Capture => {
            controller.capture();
        }
        SessionCommand::Save(path) => {
            let Some(path) = path.or_else(Canvas::default_save_path) else {
                controller
                    .surface_mut()
                    .show(&Presentation::status("No pictures directory; give a path to save to."));
                return;
            };
            let message = match controller.save_canvas(&path) {
                Ok(()) => format!("Saved to {}", path.display()),
                Err(err) => {
                    log::error!("Failed to save canvas: {:?}", err);
                    format!("Error saving image: {:#}", err)
                }
            };
            controller.surface_mut().show(&Presentation::status(message));
        }
        SessionCommand::Help => controller.surface_mut().show(&Presentation::status(HELP)),
        SessionCommand::Quit => controller.shutdown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSource, write_qr_png};

    fn terminal_controller() -> Controller<FakeSource, TerminalSurface<Vec<u8>>> {
        Controller::new(
            &QrPeekConfig::default(),
            FakeSource::default(),
            TerminalSurface::new(Vec::new(), false, false),
        )
    }

    fn take_output(controller: &mut Controller<FakeSource, TerminalSurface<Vec<u8>>>) -> String {
        let surface = std::mem::replace(
            controller.surface_mut(),
            TerminalSurface::new(Vec::new(), false, false),
        );
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("decode".parse(), Ok(SessionCommand::Decode));
        assert_eq!("  CAMERA ".parse(), Ok(SessionCommand::Camera));
        assert_eq!("open".parse(), Ok(SessionCommand::Open(None)));
        assert_eq!(
            "open /tmp/my code.png".parse(),
            Ok(SessionCommand::Open(Some(PathBuf::from("/tmp/my code.png"))))
        );
        assert_eq!(
            "save out.png".parse(),
            Ok(SessionCommand::Save(Some(PathBuf::from("out.png"))))
        );
        assert_eq!("q".parse(), Ok(SessionCommand::Quit));
        assert!("frobnicate".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&DecodeResult::NotFound), ExitCode::from(1));
        assert_eq!(
            exit_code(&DecodeResult::Error {
                message: "x".into()
            }),
            ExitCode::from(2)
        );
    }

    #[tokio::test]
    async fn test_session_open_decode_save() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("code.png");
        let saved = dir.path().join("annotated.png");
        write_qr_png(&image, "hello world");

        let mut controller = terminal_controller();
        execute(&mut controller, SessionCommand::Open(Some(image))).await;
        execute(&mut controller, SessionCommand::Decode).await;
        execute(&mut controller, SessionCommand::Save(Some(saved.clone()))).await;

        let out = take_output(&mut controller);
        assert!(out.contains("Selected file: code.png\n"));
        assert!(out.contains("Decoded content:\nhello world\n"));
        assert!(out.contains(&format!("Saved to {}", saved.display())));
        assert!(saved.exists());
    }

    #[tokio::test]
    async fn test_interrupt_ends_stalled_camera_start() {
        let source = FakeSource {
            hang: true,
            ..Default::default()
        };
        let live = source.live.clone();
        let mut controller = Controller::new(
            &QrPeekConfig::default(),
            source,
            TerminalSurface::new(Vec::new(), false, false),
        );

        let input: &[u8] = b"camera\ndecode\n";
        let session = run_session(&mut controller, input, || {
            tokio::time::sleep(std::time::Duration::from_millis(20))
        });
        tokio::time::timeout(std::time::Duration::from_secs(5), session)
            .await
            .expect("session ended on interrupt")
            .unwrap();

        assert_eq!(controller.camera_phase(), crate::camera::CameraPhase::Idle);
        assert_eq!(live.get(), 0);
        let out = take_output(&mut controller);
        assert!(out.contains("Accessing camera..."));
        assert!(!out.contains("Please select an image file first."));
    }

    #[tokio::test]
    async fn test_session_runs_until_end_of_input() {
        let source = FakeSource::default();
        let live = source.live.clone();
        let mut controller = Controller::new(
            &QrPeekConfig::default(),
            source,
            TerminalSurface::new(Vec::new(), false, false),
        );

        let input: &[u8] = b"camera\n\ncapture\nbogus\n";
        run_session(&mut controller, input, std::future::pending::<()>)
            .await
            .unwrap();

        assert_eq!(controller.camera_phase(), crate::camera::CameraPhase::Idle);
        assert_eq!(live.get(), 0);
        let out = take_output(&mut controller);
        assert!(out.contains("No QR code found in the image.\n"));
        assert!(out.contains("Unknown command 'bogus'"));
    }

    #[tokio::test]
    async fn test_session_capture_before_camera() {
        let mut controller = terminal_controller();
        execute(&mut controller, SessionCommand::Capture).await;
        assert_eq!(take_output(&mut controller), "");
    }

    #[tokio::test]
    async fn test_session_quit_stops_camera() {
        let mut controller = terminal_controller();
        execute(&mut controller, SessionCommand::Camera).await;
        assert!(controller.camera_phase() == crate::camera::CameraPhase::Active);
        execute(&mut controller, SessionCommand::Quit).await;
        assert!(controller.camera_phase() == crate::camera::CameraPhase::Idle);
    }
}
