pub trait Logger {
    fn log(&mut self, msg: &str);

    /// Lets callers skip formatting when the output would be discarded.
    fn enabled(&self) -> bool {
        true
    }
}

impl<'a, T> Logger for &'a mut T
where
    T: Logger,
{
    fn log(&mut self, msg: &str) {
        T::log(self, msg);
    }

    fn enabled(&self) -> bool {
        T::enabled(self)
    }
}

#[macro_export]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {
        if $crate::util::logging::Logger::enabled(&$logger) {
            $crate::util::logging::Logger::log(&mut $logger, &format!($($arg)*));
        }
    };
}

#[derive(Debug)]
pub struct PrintLogger {
    name: String,
}

impl PrintLogger {
    #[must_use]
    pub const fn new(name: String) -> PrintLogger {
        PrintLogger { name }
    }
}

impl Logger for PrintLogger {
    fn log(&mut self, msg: &str) {
        println!("[{}] {}", self.name, msg);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NothingLogger;

impl NothingLogger {
    #[must_use]
    pub const fn new() -> NothingLogger {
        NothingLogger
    }
}

impl Logger for NothingLogger {
    fn log(&mut self, _msg: &str) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Vec<String>,
}

impl MemoryLogger {
    #[must_use]
    pub const fn new() -> MemoryLogger {
        MemoryLogger { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Logger for MemoryLogger {
    fn log(&mut self, msg: &str) {
        self.lines.push(msg.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryLogger, NothingLogger};

    #[test]
    fn macro_formats_into_logger() {
        let mut logger = MemoryLogger::new();
        log!(logger, "dropped {} at {}", 3, "t=1");
        log!(&mut logger, "second");
        assert_eq!(logger.lines(), ["dropped 3 at t=1", "second"]);

        let mut nothing = NothingLogger::new();
        log!(nothing, "ignored {}", 1);
    }
}
