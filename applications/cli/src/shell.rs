//! Interactive transport shell
//!
//! Reads one command per line and drives a [`Player`]. Controller events
//! are printed as they arrive; the position stream is sampled in the
//! background so `status` can show the elapsed time.

use std::str::FromStr;

use cadence_core::Track;
use cadence_library::format_media_time;
use cadence_playback::{ControllerEvent, FocusChange, PlaybackSnapshot};
use futures_util::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::error::CliError;
use crate::player::Player;

pub const HELP: &str = "\
commands:
  play              start or resume (the selected track first)
  pause             pause playback
  stop              stop and release the track
  next | prev       skip forward or back
  seek <ms>         jump to a position
  loop              cycle the loop mode (none, one, all)
  list              show the playlist
  select <n>        highlight playlist entry n for the next play
  status            show the transport state
  art               show artwork of the current track
  rescan            re-read the library
  duck | interrupt  simulate a transient focus loss
  loss | gain       simulate losing or regaining focus
  help              show this text
  quit              leave the player";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Seek(u64),
    Loop,
    List,
    Select(usize),
    Status,
    Artwork,
    Rescan,
    Focus(FocusChange),
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();

        let parsed = match command.as_str() {
            "play" | "p" => Self::Play,
            "pause" => Self::Pause,
            "stop" | "s" => Self::Stop,
            "next" | "n" => Self::Next,
            "prev" | "previous" => Self::Previous,
            "seek" => Self::Seek(number(argument, "seek <ms>")?),
            "loop" | "l" => Self::Loop,
            "list" | "ls" => Self::List,
            "select" => Self::Select(number(argument, "select <n>")?),
            "status" | "st" => Self::Status,
            "art" => Self::Artwork,
            "rescan" => Self::Rescan,
            "duck" => Self::Focus(FocusChange::LossTransientCanDuck),
            "interrupt" => Self::Focus(FocusChange::LossTransient),
            "loss" => Self::Focus(FocusChange::Loss),
            "gain" => Self::Focus(FocusChange::Gain),
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            "" => return Err(CliError::InvalidCommand("empty line".to_string())),
            other => return Err(CliError::InvalidCommand(format!("unknown command '{other}'"))),
        };
        Ok(parsed)
    }
}

fn number<T: FromStr>(argument: Option<&str>, usage: &str) -> Result<T, CliError> {
    argument
        .and_then(|a| a.parse().ok())
        .ok_or_else(|| CliError::InvalidCommand(format!("usage: {usage}")))
}

/// `title - artist (mm:ss)`, without the length when it is unknown
pub fn track_line(track: &Track) -> String {
    match track.duration_ms {
        0 => format!("{} - {}", track.title, track.artist_name),
        ms => format!(
            "{} - {} ({})",
            track.title,
            track.artist_name,
            format_media_time(ms)
        ),
    }
}

pub fn status_line(snapshot: &PlaybackSnapshot, position_ms: u64) -> String {
    let state = format!("{:?}", snapshot.track_state).to_ascii_lowercase();
    match snapshot.now_playing() {
        Some(track) => {
            let total = match track.duration_ms {
                0 => "--:--".to_string(),
                ms => format_media_time(ms),
            };
            format!(
                "[{state}] {} - {} {}/{} loop={:?}",
                track.title,
                track.artist_name,
                format_media_time(position_ms),
                total,
                snapshot.loop_mode
            )
        }
        None => format!(
            "[{state}] nothing playing, {} in playlist, loop={:?}",
            snapshot.playlist_len, snapshot.loop_mode
        ),
    }
}

fn event_line(event: &ControllerEvent) -> String {
    match event {
        ControllerEvent::Error(error) => format!("error: {error}"),
        ControllerEvent::TrackAutoAdvanced(Some(track)) => {
            format!("now playing: {}", track_line(track))
        }
        ControllerEvent::TrackAutoAdvanced(None) => "playback stopped".to_string(),
    }
}

/// Run the shell until `quit` or end of input, then shut the controller down
pub async fn run<R, W>(player: &Player, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut events = player.controller().subscribe();
    let positions = player.controller().positions();
    tokio::pin!(positions);
    let mut position_ms = 0;

    say(&mut output, "type 'help' for commands").await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => {
                        let reply = player.execute(command, position_ms).await;
                        say(&mut output, &reply).await?;
                    }
                    Err(e) => say(&mut output, &e.to_string()).await?,
                }
            }
            event = events.recv() => match event {
                Ok(event) => say(&mut output, &event_line(&event)).await?,
                Err(RecvError::Lagged(missed)) => warn!(missed, "Shell fell behind on events"),
                Err(RecvError::Closed) => break,
            },
            Some(position) = positions.next() => position_ms = position,
        }
    }

    player.controller().shutdown().await;
    say(&mut output, "bye").await?;
    Ok(())
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
