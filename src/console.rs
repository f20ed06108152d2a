//! Process-wide console streams
//!
//! Every solution reads its input and writes its answer through this module.
//! It resolves the "current" stream pair in two steps:
//!
//! 1. a pair bound to the calling thread, if any (case worker threads are
//!    bound to their own case's streams for their whole life), then
//! 2. the process-wide pair, which is real stdin/stdout unless a
//!    [`crate::redirect::RedirectionHandle`] has swapped it.
//!
//! Case-local streams can be closed. After that, writes fail with
//! `BrokenPipe` and reads fail the same way, which is how an abandoned
//! worker is kept away from later cases.
//!
//! Threads a solution starts with plain [`std::thread::spawn`] are not bound
//! and resolve through the process-wide pair. One that outlives its case,
//! even a case that passed, writes into whichever case is redirected next.
//! Helpers started with [`spawn`] inherit the caller's pair instead, so once
//! their case is over their console I/O fails like an abandoned worker's.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::str::FromStr;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;

use crate::error::{HarnessError, HarnessResult};

static STDOUT_SINK: LazyLock<OutputSink> = LazyLock::new(|| OutputSink::new(SinkTarget::Stdout));

static STDIN_SOURCE: LazyLock<InputSource> =
    LazyLock::new(|| InputSource::new(Box::new(BufReader::new(io::stdin()))));

static GLOBAL: LazyLock<RwLock<StreamPair>> = LazyLock::new(|| RwLock::new(StreamPair::standard()));

thread_local! {
    static BOUND: RefCell<Option<StreamPair>> = const { RefCell::new(None) };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn closed_error(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, format!("{what} closed"))
}

// =============================================================================
// OUTPUT
// =============================================================================

enum SinkTarget {
    Stdout,
    Buffer(Vec<u8>),
}

struct SinkState {
    target: SinkTarget,
    closed: bool,
}

/// Where console output currently goes: the real stdout or a capture buffer.
///
/// Clones share the same underlying sink.
#[derive(Clone)]
pub struct OutputSink {
    state: Arc<Mutex<SinkState>>,
}

impl OutputSink {
    fn new(target: SinkTarget) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                target,
                closed: false,
            })),
        }
    }

    /// The process's real standard output
    pub fn stdout() -> Self {
        STDOUT_SINK.clone()
    }

    /// A fresh in-memory capture buffer
    pub fn capture() -> Self {
        Self::new(SinkTarget::Buffer(Vec::new()))
    }

    /// Whether this sink captures into memory
    pub fn is_capture(&self) -> bool {
        matches!(lock(&self.state).target, SinkTarget::Buffer(_))
    }

    /// Whether both handles refer to the same sink
    pub fn same_as(&self, other: &OutputSink) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(closed_error("output sink"));
        }
        match &mut state.target {
            SinkTarget::Stdout => io::stdout().write_all(buf),
            SinkTarget::Buffer(bytes) => {
                bytes.extend_from_slice(buf);
                Ok(())
            }
        }
    }

    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match args.as_str() {
            Some(text) => self.write_all(text.as_bytes()),
            None => self.write_all(fmt::format(args).as_bytes()),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let state = lock(&self.state);
        if state.closed {
            return Err(closed_error("output sink"));
        }
        match state.target {
            SinkTarget::Stdout => io::stdout().flush(),
            SinkTarget::Buffer(_) => Ok(()),
        }
    }

    /// Bytes captured so far (always empty for stdout)
    pub fn captured(&self) -> Vec<u8> {
        match &lock(&self.state).target {
            SinkTarget::Stdout => Vec::new(),
            SinkTarget::Buffer(bytes) => bytes.clone(),
        }
    }

    /// Close a capture sink. The real stdout is never closed.
    pub(crate) fn close(&self) {
        let mut state = lock(&self.state);
        if matches!(state.target, SinkTarget::Buffer(_)) {
            state.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        let kind = match &state.target {
            SinkTarget::Stdout => "stdout".to_string(),
            SinkTarget::Buffer(bytes) => format!("capture({} bytes)", bytes.len()),
        };
        f.debug_struct("OutputSink")
            .field("kind", &kind)
            .field("closed", &state.closed)
            .finish()
    }
}

// =============================================================================
// INPUT
// =============================================================================

struct InputState {
    reader: Box<dyn BufRead + Send>,
    /// Raw bytes of the line being tokenized, terminator included
    line: Vec<u8>,
    /// Read position inside `line`
    pos: usize,
    closed: bool,
}

impl InputState {
    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(closed_error("input source"))
        } else {
            Ok(())
        }
    }

    fn rest(&self) -> &[u8] {
        &self.line[self.pos..]
    }

    /// Load the next raw line. Returns false at end of input.
    fn fill_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        self.pos = 0;
        Ok(self.reader.read_until(b'\n', &mut self.line)? > 0)
    }

    fn next_token(&mut self) -> io::Result<Option<String>> {
        self.ensure_open()?;
        loop {
            while self.pos < self.line.len() && self.line[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.line.len() {
                let start = self.pos;
                while self.pos < self.line.len() && !self.line[self.pos].is_ascii_whitespace() {
                    self.pos += 1;
                }
                return Ok(Some(String::from_utf8_lossy(&self.line[start..self.pos]).into_owned()));
            }
            if !self.fill_line()? {
                return Ok(None);
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.ensure_open()?;
        if !self.rest().iter().all(u8::is_ascii_whitespace) {
            let line = strip_terminator(self.rest());
            self.pos = self.line.len();
            return Ok(Some(line));
        }
        if !self.fill_line()? {
            return Ok(None);
        }
        self.pos = self.line.len();
        Ok(Some(strip_terminator(&self.line)))
    }

    fn read_to_string(&mut self) -> io::Result<String> {
        self.ensure_open()?;
        let mut bytes = self.rest().to_vec();
        self.pos = self.line.len();
        self.reader.read_to_end(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if self.pos < self.line.len() {
            let n = buf.len().min(self.line.len() - self.pos);
            buf[..n].copy_from_slice(&self.line[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        self.reader.read(buf)
    }
}

fn strip_terminator(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && raw[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Where console input currently comes from: the real stdin or a case's text.
///
/// Carries its own token scanner state, so tokens, lines and raw reads can be
/// mixed freely. Clones share the same underlying source.
#[derive(Clone)]
pub struct InputSource {
    state: Arc<Mutex<InputState>>,
}

impl InputSource {
    fn new(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InputState {
                reader,
                line: Vec::new(),
                pos: 0,
                closed: false,
            })),
        }
    }

    /// The process's real standard input
    pub fn stdin() -> Self {
        STDIN_SOURCE.clone()
    }

    /// A readable view over `text` encoded as UTF-8
    pub fn from_text(text: &str) -> Self {
        Self::new(Box::new(Cursor::new(text.as_bytes().to_vec())))
    }

    pub fn same_as(&self, other: &InputSource) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Next whitespace-separated token, or `None` at end of input
    pub fn next_token(&self) -> io::Result<Option<String>> {
        lock(&self.state).next_token()
    }

    /// Next line without its terminator, or `None` at end of input.
    ///
    /// If token reads left non-blank text on the current line, that text is
    /// returned instead of a fresh line.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        lock(&self.state).read_line()
    }

    /// Everything not yet consumed
    pub fn read_to_string(&self) -> io::Result<String> {
        lock(&self.state).read_to_string()
    }

    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        lock(&self.state).read(buf)
    }

    /// Close a case source. The real stdin is never closed.
    pub(crate) fn close(&self) {
        if !self.same_as(&STDIN_SOURCE) {
            lock(&self.state).closed = true;
        }
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.same_as(&STDIN_SOURCE) { "stdin" } else { "text" };
        f.debug_struct("InputSource").field("kind", &kind).finish()
    }
}

// =============================================================================
// STREAM PAIR
// =============================================================================

/// An input source together with an output sink
#[derive(Debug, Clone)]
pub struct StreamPair {
    pub input: InputSource,
    pub output: OutputSink,
}

impl StreamPair {
    /// Real stdin and stdout
    pub fn standard() -> Self {
        Self {
            input: InputSource::stdin(),
            output: OutputSink::stdout(),
        }
    }

    /// Case-local streams: `input` as the source, a fresh capture buffer as the sink
    pub fn for_case(input: &str) -> Self {
        Self {
            input: InputSource::from_text(input),
            output: OutputSink::capture(),
        }
    }

    pub fn same_as(&self, other: &StreamPair) -> bool {
        self.input.same_as(&other.input) && self.output.same_as(&other.output)
    }

    /// Close both streams so further console I/O through them fails
    pub(crate) fn interrupt(&self) {
        self.input.close();
        self.output.close();
    }
}

/// The stream pair the calling thread reads from and writes to
pub fn current() -> StreamPair {
    if let Some(pair) = BOUND.with(|bound| bound.borrow().clone()) {
        return pair;
    }
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Install `pair` as the process-wide pair, returning the one it replaces
pub(crate) fn replace_global(pair: StreamPair) -> StreamPair {
    let mut global = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *global, pair)
}

/// Bind the calling thread to `pair` for the rest of its life
pub(crate) fn bind_thread(pair: StreamPair) {
    BOUND.with(|bound| *bound.borrow_mut() = Some(pair));
}

/// Spawn a thread bound to the calling thread's current streams
pub fn spawn<F, T>(f: F) -> thread::JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let pair = current();
    thread::spawn(move || {
        bind_thread(pair);
        f()
    })
}

/// The output sink the calling thread currently writes to
pub fn current_output() -> OutputSink {
    current().output
}

/// Whether the calling thread's output is being captured
pub fn is_redirected() -> bool {
    current().output.is_capture()
}

// =============================================================================
// SOLUTION-FACING API
// =============================================================================

pub fn read_line() -> io::Result<Option<String>> {
    current().input.read_line()
}

pub fn next_token() -> io::Result<Option<String>> {
    current().input.next_token()
}

/// Read and parse the next token
pub fn next<T: FromStr>() -> HarnessResult<T> {
    let token = next_token()?.ok_or(HarnessError::InputExhausted)?;
    token.parse().map_err(|_| HarnessError::InvalidToken {
        token,
        target: std::any::type_name::<T>(),
    })
}

pub fn read_to_string() -> io::Result<String> {
    current().input.read_to_string()
}

pub fn write_str(text: &str) -> io::Result<()> {
    current().output.write_all(text.as_bytes())
}

pub fn write_fmt(args: fmt::Arguments<'_>) -> io::Result<()> {
    current().output.write_fmt(args)
}

pub fn flush() -> io::Result<()> {
    current().output.flush()
}

/// `io::Write` handle that always targets the current output sink
pub fn stdout() -> ConsoleWriter {
    ConsoleWriter
}

/// `io::Read` handle that always reads the current input source
pub fn stdin() -> ConsoleReader {
    ConsoleReader
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        current().output.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        flush()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleReader;

impl Read for ConsoleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        current().input.read(buf)
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    if let Err(e) = write_fmt(args) {
        panic!("failed printing to console: {e}");
    }
}

/// Print to the current console output, like `print!`
#[macro_export]
macro_rules! out {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

/// Print a line to the current console output, like `println!`
#[macro_export]
macro_rules! outln {
    () => {
        $crate::console::_print(format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!("{}\n", format_args!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_and_lines_mix() {
        let input = InputSource::from_text("3 4\nhello world\n\n  7\r\n");
        assert_eq!(input.next_token().unwrap().as_deref(), Some("3"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some(" 4"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("hello world"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(input.next_token().unwrap().as_deref(), Some("7"));
        assert_eq!(input.next_token().unwrap(), None);
        assert_eq!(input.read_line().unwrap(), None);
    }

    #[test]
    fn test_line_after_last_token_moves_on() {
        let input = InputSource::from_text("3\nabc\n");
        assert_eq!(input.next_token().unwrap().as_deref(), Some("3"));
        assert_eq!(input.read_line().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_read_to_string_keeps_unconsumed_rest() {
        let input = InputSource::from_text("1 2\n3\n");
        assert_eq!(input.next_token().unwrap().as_deref(), Some("1"));
        assert_eq!(input.read_to_string().unwrap(), " 2\n3\n");
        assert_eq!(input.read_to_string().unwrap(), "");
    }

    #[test]
    fn test_raw_reads_after_token() {
        let input = InputSource::from_text("ab cd");
        assert_eq!(input.next_token().unwrap().as_deref(), Some("ab"));
        let mut buf = [0u8; 8];
        let n = input.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b" cd");
    }

    #[test]
    fn test_closed_streams_refuse_io() {
        let pair = StreamPair::for_case("1\n");
        pair.output.write_all(b"before").unwrap();
        pair.interrupt();

        let err = pair.output.write_all(b"after").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(pair.input.next_token().is_err());
        assert_eq!(pair.output.captured(), b"before");
        assert!(pair.output.is_closed());
    }

    #[test]
    fn test_standard_streams_never_close() {
        let pair = StreamPair::standard();
        pair.interrupt();
        assert!(!pair.output.is_closed());
        assert!(pair.same_as(&StreamPair::standard()));
    }

    #[test]
    fn test_bound_thread_uses_its_own_streams() {
        let pair = StreamPair::for_case("5 six\n");
        let sink = pair.output.clone();

        std::thread::spawn(move || {
            bind_thread(pair);
            assert!(is_redirected());
            let n: i64 = next().unwrap();
            let err = next::<i64>().unwrap_err();
            assert!(matches!(err, HarnessError::InvalidToken { ref token, .. } if token == "six"));
            assert!(matches!(next::<i64>(), Err(HarnessError::InputExhausted)));
            crate::outln!("n = {}", n);
            crate::out!("done");
            writeln!(stdout(), "!").unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(String::from_utf8(sink.captured()).unwrap(), "n = 5\ndone!\n");
    }
}
