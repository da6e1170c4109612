//! External process invocation
//!
//! Decompression fallbacks and the container orchestrator are driven through
//! [`ProcessRunner`], which returns a structured [`ProcessOutput`] instead of
//! letting exit codes leak straight into the installer's own exit status.

use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// Let the child write directly to the terminal instead of capturing
    pub inherit_output: bool,
}

impl CommandSpec {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            current_dir: None,
            inherit_output: false,
        }
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_string()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.inherit_output = true;
        self
    }

    /// Shell-like rendering for logs and messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub trait ProcessRunner {
    /// Run a command to completion
    fn run(&self, spec: &CommandSpec) -> io::Result<ProcessOutput>;

    /// Whether `program` can be found on PATH
    fn is_available(&self, program: &str) -> bool;
}

/// Runs real processes on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<ProcessOutput> {
        debug!("Executing: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        if spec.inherit_output {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?;
            return Ok(ProcessOutput {
                exit_code: status.code(),
                ..Default::default()
            });
        }

        let output = command.stdin(Stdio::null()).output()?;
        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("{} exited with {:?}", spec.program, result.exit_code);
        Ok(result)
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable runner for exercising code that shells out

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    type Handler = Box<dyn Fn(&CommandSpec) -> ProcessOutput>;

    pub struct FakeRunner {
        available: HashSet<String>,
        handlers: Vec<(String, Handler)>,
        pub calls: RefCell<Vec<CommandSpec>>,
    }

    impl FakeRunner {
        pub fn new(available: &[&str]) -> Self {
            Self {
                available: available.iter().map(|p| p.to_string()).collect(),
                handlers: Vec::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        /// Answer commands whose rendered form starts with `prefix`
        pub fn on<F>(mut self, prefix: &str, handler: F) -> Self
        where
            F: Fn(&CommandSpec) -> ProcessOutput + 'static,
        {
            self.handlers.push((prefix.to_string(), Box::new(handler)));
            self
        }

        pub fn rendered_calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(CommandSpec::display).collect()
        }
    }

    pub fn ok(stdout: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, spec: &CommandSpec) -> io::Result<ProcessOutput> {
            self.calls.borrow_mut().push(spec.clone());
            let rendered = spec.display();
            match self
                .handlers
                .iter()
                .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
            {
                Some((_, handler)) => Ok(handler(spec)),
                None if self.available.contains(&spec.program) => Ok(ok("")),
                None => Err(io::Error::new(io::ErrorKind::NotFound, rendered)),
            }
        }

        fn is_available(&self, program: &str) -> bool {
            self.available.contains(program)
        }
    }
}
