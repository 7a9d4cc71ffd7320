//! Collapse `perf script` output into folded stacks.
//!
//! Input is a sequence of sample blocks:
//!
//! ```text
//! java 4021/4025 [003] 1813.421: 250000 cycles:
//!         7f3e1c2a4b10 Interpreter::run+0x1c (/usr/lib/jvm/libjvm.so)
//!         7f3e1c2a0042 JavaMain (/usr/lib/jvm/libjli.so)
//!
//! ```
//!
//! The header names the process, the frame lines list the stack leaf first,
//! and a blank line ends the block. Each block becomes one folded stack,
//! root first, with the process name as its outermost frame.

use super::folded::FoldOutcome;
use super::source::{for_each_line, open_source};
use crate::utils::error::AnalysisError;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

static HEADER_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S.+?)\s+([0-9]+)(?:/([0-9]+))?\s+").expect("valid regex"));
static HEADER_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*([0-9]+)?\s+(\S+):\s*$").expect("valid regex"));
static FRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9A-Fa-fx]+)\s*(.+) \((.*)\)\s*$").expect("valid regex"));
static FRAME_NOIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+) \((.*)\)\s*$").expect("valid regex"));
static ADDR_OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\+0x[0-9A-Fa-f]+$").expect("valid regex"));
static JIT_DSO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/tmp/perf-[0-9]+\.map").expect("valid regex"));
static DOTTED_ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\(.*\)\.").expect("valid regex"));

const UNKNOWN_SYMBOL: &str = "[unknown]";
const ANONYMOUS_NAMESPACE: &str = "(anonymous namespace)";
const MAX_SKIP_WARNINGS: usize = 5;

/// Options controlling how perf script samples are folded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseOptions {
    /// Append the PID to the process frame ("comm pid")
    pub include_pid: bool,

    /// Append PID/TID to the process frame ("comm pid/tid")
    pub include_tid: bool,

    /// Suffix frames from kernel DSOs with `_[k]`
    pub kernel: bool,

    /// Suffix frames from JIT maps with `_[j]`
    pub jit: bool,

    /// Both `kernel` and `jit`
    pub annotate_all: bool,

    /// Keep `+0x..` offsets and show addresses of unknown symbols
    pub addrs: bool,

    /// Only fold samples of this event; empty means the first event seen
    pub event_filter: String,

    /// Weight each sample by the period in its header instead of 1
    pub period_weights: bool,
}

/// One frame line of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub ip: String,
    pub symbol: String,
    pub dso: String,
}

/// Header fields of a sample block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleHeader {
    pub comm: String,
    pub pid: String,
    pub tid: String,
    pub period: u64,
    pub event: Option<String>,
}

#[derive(Debug, Default)]
struct SampleRecord {
    header: Option<SampleHeader>,
    // leaf first, as printed by perf
    frames: Vec<Frame>,
}

/// Parse a sample header line
///
/// **Public** - exposed for tests and tooling
pub fn parse_header(line: &str) -> Option<SampleHeader> {
    let caps = HEADER_HEAD_RE.captures(line)?;
    let comm = caps[1].replace(' ', "_");
    let pid = caps[2].to_string();
    let tid = caps
        .get(3)
        .map_or_else(|| pid.clone(), |m| m.as_str().to_string());

    let (period, event) = match HEADER_TAIL_RE.captures(line) {
        Some(tail) => (
            tail.get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1),
            Some(tail[2].to_string()),
        ),
        None => (1, None),
    };

    Some(SampleHeader {
        comm,
        pid,
        tid,
        period,
        event,
    })
}

/// Parse a frame line (`[ip] symbol[+0xoff] (dso)`)
pub fn parse_frame(line: &str) -> Option<Frame> {
    let (ip, raw_symbol, dso) = if let Some(caps) = FRAME_RE.captures(line) {
        (caps[1].to_string(), caps[2].to_string(), caps[3].to_string())
    } else {
        let caps = FRAME_NOIP_RE.captures(line)?;
        (String::new(), caps[1].to_string(), caps[2].to_string())
    };

    let bare = strip_addr_offset(&raw_symbol).trim();
    let missing = bare.is_empty() || bare == "?";
    let symbol = if missing {
        UNKNOWN_SYMBOL.to_string()
    } else {
        raw_symbol
    };

    Some(Frame { ip, symbol, dso })
}

fn strip_addr_offset(symbol: &str) -> &str {
    ADDR_OFFSET_RE
        .captures(symbol)
        .and_then(|c| c.get(1))
        .map_or(symbol, |m| m.as_str())
}

fn is_kernel_dso(dso: &str) -> bool {
    if dso.is_empty() || dso.contains("unknown") {
        return false;
    }
    dso.starts_with('[') || dso.ends_with("vmlinux")
}

fn is_jit_dso(dso: &str) -> bool {
    !dso.is_empty() && JIT_DSO_RE.is_match(dso)
}

/// Drop a C++ argument list, keeping `(anonymous namespace)` scopes and
/// Go-style `pkg.(*T).method` names intact
fn strip_arguments(func: &str) -> String {
    let func: String = func.chars().filter(|c| *c != '"' && *c != '\'').collect();
    if DOTTED_ARGS_RE.is_match(&func) {
        return func;
    }
    let cut = func
        .match_indices('(')
        .map(|(i, _)| i)
        .find(|&i| !func[i..].starts_with(ANONYMOUS_NAMESPACE));
    match cut {
        Some(i) => func[..i].to_string(),
        None => func,
    }
}

fn base_name(dso: &str) -> &str {
    dso.rsplit('/').next().unwrap_or(dso)
}

fn frame_name(symbol: &str, dso: &str, options: &CollapseOptions) -> String {
    let mut name = if options.addrs {
        symbol.to_string()
    } else {
        strip_addr_offset(symbol).to_string()
    };

    if (options.kernel || options.annotate_all) && is_kernel_dso(dso) && !name.ends_with("_[k]") {
        name.push_str("_[k]");
    }
    if (options.jit || options.annotate_all) && is_jit_dso(dso) && !name.ends_with("_[j]") {
        name.push_str("_[j]");
    }
    name
}

fn process_frame(header: Option<&SampleHeader>, options: &CollapseOptions) -> String {
    let Some(header) = header else {
        return "unknown".to_string();
    };
    let comm = if header.comm.is_empty() { "unknown" } else { header.comm.as_str() };

    if options.include_tid && !header.pid.is_empty() && !header.tid.is_empty() {
        format!("{} {}/{}", comm, header.pid, header.tid)
    } else if options.include_pid && !header.pid.is_empty() {
        format!("{} {}", comm, header.pid)
    } else {
        comm.to_string()
    }
}

/// Frames of one sample, root first
fn build_frames(record: &SampleRecord, options: &CollapseOptions) -> Vec<String> {
    let mut parts = vec![process_frame(record.header.as_ref(), options)];

    for frame in record.frames.iter().rev() {
        let display = frame.symbol.replace(';', ":");

        let segments: Vec<String> = display
            .split("->")
            .filter(|p| !p.is_empty())
            .map(|part| {
                if part.trim() != UNKNOWN_SYMBOL {
                    return strip_arguments(part);
                }
                let inner = if !frame.dso.is_empty() && frame.dso.trim() != UNKNOWN_SYMBOL {
                    base_name(&frame.dso)
                } else {
                    "unknown"
                };
                if options.addrs && !frame.ip.is_empty() {
                    format!("[{} <{}>]", inner, frame.ip)
                } else {
                    format!("[{}]", inner)
                }
            })
            .collect();

        if segments.is_empty() {
            parts.push(frame_name(&display, &frame.dso, options));
            continue;
        }
        for segment in segments.iter().rev() {
            parts.push(frame_name(segment, &frame.dso, options));
        }
    }

    parts
}

/// Streaming state of one collapse run
struct ScriptCollapser<'a> {
    options: &'a CollapseOptions,
    outcome: FoldOutcome,
    current: SampleRecord,
    first_event: Option<String>,
    filtered_samples: usize,
}

impl<'a> ScriptCollapser<'a> {
    fn new(options: &'a CollapseOptions) -> Self {
        Self {
            options,
            outcome: FoldOutcome::default(),
            current: SampleRecord::default(),
            first_event: None,
            filtered_samples: 0,
        }
    }

    fn passes_event_filter(&mut self, event: Option<&str>) -> bool {
        let Some(event) = event else {
            return true;
        };
        if !self.options.event_filter.is_empty() {
            return event == self.options.event_filter;
        }
        match &self.first_event {
            Some(first) => event == first,
            None => {
                debug!("Folding samples of first seen event: {}", event);
                self.first_event = Some(event.to_string());
                true
            }
        }
    }

    fn flush(&mut self) {
        let record = std::mem::take(&mut self.current);
        if record.header.is_none() && record.frames.is_empty() {
            return;
        }

        let event = record.header.as_ref().and_then(|h| h.event.clone());
        if !self.passes_event_filter(event.as_deref()) {
            self.filtered_samples += 1;
            return;
        }

        let weight = match (&record.header, self.options.period_weights) {
            (Some(header), true) => header.period,
            _ => 1,
        };
        let frames = build_frames(&record, self.options);
        if !self.outcome.store.insert_frames(&frames, weight) {
            self.outcome.skipped_lines += 1;
            warn!("Skipping sample of weight {}: total weight overflow", weight);
        }
    }

    fn push(&mut self, raw: &str) {
        self.outcome.lines_read += 1;
        let line = raw.trim_end();

        if line.is_empty() {
            self.flush();
            return;
        }
        if line.trim_start().starts_with('#') {
            return;
        }

        // Frame lines always end in "(dso)", headers never do
        if line.ends_with(')') {
            if let Some(frame) = parse_frame(line) {
                self.current.frames.push(frame);
                return;
            }
        }
        if let Some(header) = parse_header(line) {
            self.flush();
            self.current.header = Some(header);
            return;
        }

        self.outcome.skipped_lines += 1;
        if self.outcome.skipped_lines <= MAX_SKIP_WARNINGS {
            warn!(
                "Skipping unrecognized perf script line {}: {:?}",
                self.outcome.lines_read, line
            );
        }
    }

    fn finish(mut self) -> Result<FoldOutcome, AnalysisError> {
        self.flush();
        if self.filtered_samples > 0 {
            debug!(
                "Event filter dropped {} sample(s)",
                self.filtered_samples
            );
        }
        self.outcome.require_records()
    }
}

/// Collapse perf script lines into a folded store
///
/// **Public** - main entry point for in-memory perf script text
///
/// # Errors
/// * `AnalysisError::EmptyOrMalformedInput` - No sample could be folded
pub fn collapse_lines<I, S>(lines: I, options: &CollapseOptions) -> Result<FoldOutcome, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut collapser = ScriptCollapser::new(options);
    for line in lines {
        collapser.push(line.as_ref());
    }
    collapser.finish()
}

/// Collapse a streamed perf script reader
pub fn collapse_reader<R: BufRead>(
    reader: R,
    source: &Path,
    options: &CollapseOptions,
) -> Result<FoldOutcome, AnalysisError> {
    let mut collapser = ScriptCollapser::new(options);
    for_each_line(reader, source, |line| collapser.push(line))?;
    collapser.finish()
}

/// Collapse a perf script file (`-` for stdin)
///
/// # Errors
/// * `AnalysisError::SourceUnavailable` - File cannot be opened or read
/// * `AnalysisError::EmptyOrMalformedInput` - No sample could be folded
pub fn collapse_file(path: impl AsRef<Path>, options: &CollapseOptions) -> Result<FoldOutcome, AnalysisError> {
    let path = path.as_ref();
    let reader = open_source(path)?;
    collapse_reader(reader, path, options)
}
