//! Line-oriented driver for a placement manager running over the simulated
//! collaborators.
//!
//! Each non-blank line is one command; `#` starts a comment. A line that
//! fails to parse or execute is reported and the session carries on.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use indoc::indoc;
use thiserror::Error;

use crate::commands::PlacementCommand;
use crate::config::PlacementConfig;
use crate::error::PlacementError;
use crate::event::Subscription;
use crate::panel::PanelId;
use crate::sim::{InMemoryViewRegistry, VirtualWindowProvider};
use crate::view::{ParseLocationError, ViewContainerLocation, ViewDescriptor, ViewId};
use crate::window::PlacementManager;

pub const HELP: &str = indoc! {"
    commands:
      float [VIEW]                 float VIEW (default: focused view)
      dock LOCATION [VIEW]         dock VIEW into sidebar, panel or auxiliarybar
      run COMMAND-ID [VIEW]        run a placement command by id, e.g. view.dockToPanel
      close PANEL                  close a floating panel
      unload PANEL                 close a panel's window as the user would
      focus [VIEW]                 set (or clear) the focused view
      register ID[:NAME][:fixed] [LOCATION]
                                   add a view to the registry
      list                         show floating panels
      views                        show registered views
      help                         show this text
"};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("invalid panel id `{0}`")]
    InvalidPanelId(String),
    #[error("invalid view spec `{0}` (expected ID[:NAME][:fixed])")]
    InvalidViewSpec(String),
    #[error(transparent)]
    InvalidLocation(#[from] ParseLocationError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Run {
        command: PlacementCommand,
        target: Option<ViewId>,
    },
    Close(PanelId),
    Unload(PanelId),
    Focus(Option<ViewId>),
    Register {
        descriptor: ViewDescriptor,
        location: ViewContainerLocation,
    },
    List,
    Views,
    Help,
}

/// Parse `ID[:NAME][:fixed]`. The name defaults to the id; `fixed` marks the
/// view as not movable.
pub fn parse_view_spec(spec: &str) -> Result<ViewDescriptor, ScriptError> {
    let mut parts = spec.split(':');
    let id = parts.next().unwrap_or_default().trim();
    if id.is_empty() {
        return Err(ScriptError::InvalidViewSpec(spec.to_string()));
    }
    let name = parts
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(id);
    let can_move_view = match parts.next() {
        None => true,
        Some("fixed") => false,
        Some(_) => return Err(ScriptError::InvalidViewSpec(spec.to_string())),
    };
    if parts.next().is_some() {
        return Err(ScriptError::InvalidViewSpec(spec.to_string()));
    }
    Ok(ViewDescriptor::new(id, name).with_can_move_view(can_move_view))
}

fn parse_panel_id(arg: Option<&str>, command: &'static str) -> Result<PanelId, ScriptError> {
    let arg = arg.ok_or(ScriptError::MissingArgument {
        command,
        expected: "a panel id",
    })?;
    arg.parse::<u64>()
        .map(PanelId::new)
        .map_err(|_| ScriptError::InvalidPanelId(arg.to_string()))
}

/// The optional trailing view id shared by the placement commands.
fn take_view_arg(args: &mut Vec<&str>) -> Result<Option<ViewId>, ScriptError> {
    match args.len() {
        0 => Ok(None),
        1 => Ok(Some(ViewId::from(args.remove(0)))),
        _ => Err(ScriptError::UnexpectedArgument(args[1].to_string())),
    }
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let line = line.split('#').next().unwrap_or_default();
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let mut args: Vec<&str> = words.collect();
    let command = match head {
        "float" => ScriptCommand::Run {
            command: PlacementCommand::Float,
            target: take_view_arg(&mut args)?,
        },
        "dock" => {
            if args.is_empty() {
                return Err(ScriptError::MissingArgument {
                    command: "dock",
                    expected: "a location",
                });
            }
            let location: ViewContainerLocation = args.remove(0).parse()?;
            ScriptCommand::Run {
                command: PlacementCommand::dock_to(location),
                target: take_view_arg(&mut args)?,
            }
        }
        "run" => {
            if args.is_empty() {
                return Err(ScriptError::MissingArgument {
                    command: "run",
                    expected: "a command id",
                });
            }
            let id = args.remove(0);
            let command = PlacementCommand::from_id(id)
                .ok_or_else(|| ScriptError::UnknownCommand(id.to_string()))?;
            ScriptCommand::Run {
                command,
                target: take_view_arg(&mut args)?,
            }
        }
        "close" | "unload" => {
            let (name, close) = if head == "close" {
                ("close", true)
            } else {
                ("unload", false)
            };
            let id = parse_panel_id(args.first().copied(), name)?;
            if let Some(extra) = args.get(1) {
                return Err(ScriptError::UnexpectedArgument(extra.to_string()));
            }
            if close {
                ScriptCommand::Close(id)
            } else {
                ScriptCommand::Unload(id)
            }
        }
        "focus" => ScriptCommand::Focus(take_view_arg(&mut args)?),
        "register" => {
            if args.is_empty() {
                return Err(ScriptError::MissingArgument {
                    command: "register",
                    expected: "a view spec",
                });
            }
            let descriptor = parse_view_spec(args.remove(0))?;
            let location = match args.len() {
                0 => ViewContainerLocation::Sidebar,
                1 => args[0].parse()?,
                _ => return Err(ScriptError::UnexpectedArgument(args[1].to_string())),
            };
            ScriptCommand::Register {
                descriptor,
                location,
            }
        }
        "list" | "views" | "help" if !args.is_empty() => {
            return Err(ScriptError::UnexpectedArgument(args[0].to_string()));
        }
        "list" => ScriptCommand::List,
        "views" => ScriptCommand::Views,
        "help" => ScriptCommand::Help,
        other => return Err(ScriptError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Views registered when none are given on the command line.
pub fn default_views() -> Vec<(ViewDescriptor, ViewContainerLocation)> {
    vec![
        (
            ViewDescriptor::new("explorer", "Explorer"),
            ViewContainerLocation::Sidebar,
        ),
        (
            ViewDescriptor::new("search", "Search"),
            ViewContainerLocation::Sidebar,
        ),
        (
            ViewDescriptor::new("terminal", "Terminal"),
            ViewContainerLocation::Panel,
        ),
        (
            ViewDescriptor::new("outline", "Outline").with_can_move_view(false),
            ViewContainerLocation::Sidebar,
        ),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

/// A placement manager wired to in-memory collaborators, plus a log of the
/// lifecycle events it emitted.
pub struct Session {
    manager: PlacementManager,
    registry: Arc<InMemoryViewRegistry>,
    windows: Arc<VirtualWindowProvider>,
    events: Arc<Mutex<Vec<String>>>,
    _subscriptions: Vec<Subscription>,
}

impl Session {
    pub fn new(config: PlacementConfig) -> Self {
        let registry = Arc::new(InMemoryViewRegistry::new());
        let windows = Arc::new(VirtualWindowProvider::new());
        let manager = PlacementManager::new(registry.clone(), windows.clone(), config);
        let events = Arc::new(Mutex::new(Vec::new()));
        let opened = events.clone();
        let closed = events.clone();
        let subscriptions = vec![
            manager.on_did_open_floating_panel(move |panel| {
                if let Ok(mut log) = opened.lock() {
                    log.push(format!("opened panel {} for {}", panel.id(), panel.view_id()));
                }
            }),
            manager.on_did_close_floating_panel(move |panel| {
                if let Ok(mut log) = closed.lock() {
                    log.push(format!("closed panel {} for {}", panel.id(), panel.view_id()));
                }
            }),
        ];
        Self {
            manager,
            registry,
            windows,
            events,
            _subscriptions: subscriptions,
        }
    }

    pub fn manager(&self) -> &PlacementManager {
        &self.manager
    }

    pub fn registry(&self) -> &Arc<InMemoryViewRegistry> {
        &self.registry
    }

    pub fn windows(&self) -> &Arc<VirtualWindowProvider> {
        &self.windows
    }

    pub async fn execute<W: Write>(
        &self,
        command: ScriptCommand,
        out: &mut W,
    ) -> Result<(), ScriptError> {
        match command {
            ScriptCommand::Run { command, target } => {
                tracing::debug!(command = command.id(), view = ?target, "running command");
                command.run(&self.manager, target).await?;
            }
            ScriptCommand::Close(id) => self.manager.close_floating_panel(id),
            ScriptCommand::Unload(id) => {
                let window = self
                    .manager
                    .floating_panel(id)
                    .and_then(|panel| self.windows.window_for(panel.container()));
                match window {
                    Some(window) => window.simulate_user_close(),
                    None => writeln!(out, "panel {id} is not open")?,
                }
            }
            ScriptCommand::Focus(view_id) => self.registry.set_focused(view_id),
            ScriptCommand::Register {
                descriptor,
                location,
            } => self.registry.register(descriptor, location),
            ScriptCommand::List => self.write_panels(out)?,
            ScriptCommand::Views => self.write_views(out)?,
            ScriptCommand::Help => write!(out, "{HELP}")?,
        }
        Ok(())
    }

    fn write_panels<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let panels = self.manager.all_floating_panels();
        if panels.is_empty() {
            return writeln!(out, "no floating panels");
        }
        for panel in panels {
            writeln!(
                out,
                "panel {} view={} title={:?} container={}",
                panel.id(),
                panel.view_id(),
                panel.title(),
                panel.container().raw()
            )?;
        }
        Ok(())
    }

    fn write_views<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (descriptor, location) in self.registry.descriptors() {
            writeln!(
                out,
                "{} name={:?} location={} movable={} floating={}",
                descriptor.id,
                descriptor.name,
                location,
                descriptor.can_move_view,
                self.manager.is_view_floating(&descriptor.id)
            )?;
        }
        Ok(())
    }

    fn flush_events<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let drained: Vec<String> = match self.events.lock() {
            Ok(mut log) => log.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for line in drained {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Execute every line of `reader`, writing results and events to `out`.
    pub async fn run<R: BufRead, W: Write>(
        &self,
        reader: R,
        out: &mut W,
    ) -> io::Result<ScriptSummary> {
        let mut summary = ScriptSummary::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let result = match parse_line(&line) {
                Ok(Some(command)) => self.execute(command, out).await,
                Ok(None) => continue,
                Err(err) => Err(err),
            };
            summary.executed += 1;
            match result {
                Ok(()) => {}
                Err(ScriptError::Io(err)) => return Err(err),
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(line = index + 1, error = %err, "script line failed");
                    writeln!(out, "error: line {}: {}", index + 1, err)?;
                }
            }
            self.flush_events(out)?;
        }
        Ok(summary)
    }

    /// Close any panels still floating and report their close events.
    pub fn shutdown<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.manager.shutdown();
        self.flush_events(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_spec_variants() {
        let d = parse_view_spec("explorer").unwrap();
        assert_eq!((d.name.as_str(), d.can_move_view), ("explorer", true));
        let d = parse_view_spec("outline:Outline:fixed").unwrap();
        assert_eq!((d.name.as_str(), d.can_move_view), ("Outline", false));
        assert!(parse_view_spec(":Nameless").is_err());
        assert!(parse_view_spec("a:b:pinned").is_err());
        assert!(parse_view_spec("a:b:fixed:extra").is_err());
    }

    #[test]
    fn parses_commands_and_skips_comments() {
        assert_eq!(parse_line("   # nothing here").unwrap(), None);
        assert_eq!(
            parse_line("float explorer # detach").unwrap(),
            Some(ScriptCommand::Run {
                command: PlacementCommand::Float,
                target: Some(ViewId::from("explorer")),
            })
        );
        assert_eq!(
            parse_line("dock auxiliarybar").unwrap(),
            Some(ScriptCommand::Run {
                command: PlacementCommand::DockToAuxiliaryBar,
                target: None,
            })
        );
        assert_eq!(
            parse_line("run view.dockToPanel search").unwrap(),
            Some(ScriptCommand::Run {
                command: PlacementCommand::DockToPanel,
                target: Some(ViewId::from("search")),
            })
        );
        assert_eq!(
            parse_line("unload 4").unwrap(),
            Some(ScriptCommand::Unload(PanelId::new(4)))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_line("dock"),
            Err(ScriptError::MissingArgument { command: "dock", .. })
        ));
        assert!(matches!(
            parse_line("dock editor explorer"),
            Err(ScriptError::InvalidLocation(_))
        ));
        assert!(matches!(
            parse_line("close abc"),
            Err(ScriptError::InvalidPanelId(_))
        ));
        assert!(matches!(
            parse_line("float a b"),
            Err(ScriptError::UnexpectedArgument(_))
        ));
        assert!(matches!(
            parse_line("list now"),
            Err(ScriptError::UnexpectedArgument(_))
        ));
        assert!(matches!(
            parse_line("explode"),
            Err(ScriptError::UnknownCommand(_))
        ));
    }
}
