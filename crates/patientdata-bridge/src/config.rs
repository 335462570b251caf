use std::collections::BTreeMap;
use std::ffi::OsString;
use std::time::Duration;

/// Delays and deadlines of one tool invocation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeTimings {
    /// Upper bound on waiting for the `initialize` response before the
    /// `notifications/initialized` acknowledgement is sent.
    pub init_settle: Duration,
    /// Pause between the acknowledgement and the `tools/call` request.
    pub ack_settle: Duration,
    /// How often collected responses are checked for the tool call answer.
    pub poll_interval: Duration,
    /// Hard limit on waiting for the tool call answer. A server that stays
    /// alive past it is rejected with a timeout; one whose stdout closes
    /// earlier is settled by the final check.
    pub timeout: Duration,
}

impl Default for BridgeTimings {
    fn default() -> Self {
        Self {
            init_settle: Duration::from_millis(200),
            ack_settle: Duration::from_millis(200),
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
        }
    }
}

/// How to launch the tool server for each invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub envs: BTreeMap<OsString, OsString>,
    pub timings: BridgeTimings,
}

impl BridgeConfig {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: BTreeMap::new(),
            timings: BridgeTimings::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    pub fn with_timings(mut self, timings: BridgeTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Build a config from a whitespace-separated command line such as
    /// `patientdata-mcp --data ./patients.json`.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}
