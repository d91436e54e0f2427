// src/job/model.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Prefix the execution engine reads as "run on the controlling node".
pub const LOCAL_MARKER: &str = "LOCAL";

/// Separator between the steps of a sequential command.
pub const SEQUENCE_SEPARATOR: &str = " ; ";

/// How a job is invoked: a literal argv, or steps run one after the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Argv(Vec<String>),
    Sequence(Vec<Invocation>),
}

impl Invocation {
    /// Render as a single shell command line.
    pub fn command_line(&self) -> String {
        match self {
            Invocation::Argv(argv) => argv
                .iter()
                .map(|arg| quote_arg(arg))
                .collect::<Vec<_>>()
                .join(" "),
            Invocation::Sequence(steps) => steps
                .iter()
                .map(Invocation::command_line)
                .collect::<Vec<_>>()
                .join(SEQUENCE_SEPARATOR),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// `$NAME` / `${NAME}` references the engine expands from the headers.
static MACRO_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{[A-Za-z_][A-Za-z0-9_]*\}|[A-Za-z_][A-Za-z0-9_]*)").expect("static regex")
});

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_./:=,+@%-".contains(c)
}

/// Quote `arg` so the shell hands it to the program unchanged.
///
/// - only safe characters and macro references: left as is
/// - macro references plus anything else: double quotes, with every `"`,
///   `\`, backtick and stray `$` escaped, so the macros still expand
/// - otherwise: single quotes
fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    let mut has_macro = false;
    let mut plain = true;
    let mut last = 0;
    for m in MACRO_REF.find_iter(arg) {
        has_macro = true;
        plain &= arg[last..m.start()].chars().all(is_shell_safe);
        last = m.end();
    }
    plain &= arg[last..].chars().all(is_shell_safe);

    if plain {
        return arg.to_string();
    }
    if !has_macro {
        return format!("'{}'", arg.replace('\'', r"'\''"));
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut last = 0;
    for m in MACRO_REF.find_iter(arg) {
        push_double_quoted(&mut out, &arg[last..m.start()]);
        out.push_str(m.as_str());
        last = m.end();
    }
    push_double_quoted(&mut out, &arg[last..]);
    out.push('"');
    out
}

fn push_double_quoted(out: &mut String, literal: &str) {
    for c in literal.chars() {
        if matches!(c, '"' | '\\' | '`' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// A declarative unit of work: an invocation plus the files it reads and
/// writes.
///
/// `inputs` never contains one of the job's own `outputs`, and every required
/// input is also an input. Both are enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    invocation: Invocation,
    inputs: Vec<String>,
    required_inputs: Vec<String>,
    outputs: Vec<String>,
    comment: Option<String>,
}

impl Job {
    /// Build a job from a literal argv.
    ///
    /// `outputs` may be empty (a pure side effect), but such a job can never
    /// be used as another job's dependency source; that is on the caller.
    pub fn new<A, I, O, R>(argv: A, inputs: I, outputs: O, required_inputs: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let argv = argv.into_iter().map(Into::into).collect();
        Self::from_parts(
            Invocation::Argv(argv),
            inputs.into_iter().map(Into::into).collect(),
            outputs.into_iter().map(Into::into).collect(),
            required_inputs.into_iter().map(Into::into).collect(),
        )
    }

    pub(crate) fn from_parts(
        invocation: Invocation,
        inputs: Vec<String>,
        outputs: Vec<String>,
        required_inputs: Vec<String>,
    ) -> Self {
        let outputs = dedup(outputs);
        let produced: HashSet<&str> = outputs.iter().map(String::as_str).collect();

        let required_inputs: Vec<String> = dedup(required_inputs)
            .into_iter()
            .filter(|r| !produced.contains(r.as_str()))
            .collect();

        let mut inputs = inputs;
        inputs.extend(required_inputs.iter().cloned());
        let inputs = dedup(inputs)
            .into_iter()
            .filter(|i| !produced.contains(i.as_str()))
            .collect();

        Self {
            invocation,
            inputs,
            required_inputs,
            outputs,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Add required inputs to an existing job. Ones the job produces itself
    /// are dropped.
    pub fn with_required_inputs<R>(self, extra: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let mut required = self.required_inputs;
        required.extend(extra.into_iter().map(Into::into));

        let mut job = Self::from_parts(self.invocation, self.inputs, self.outputs, required);
        job.comment = self.comment;
        job
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The literal argv, for jobs that are not composites.
    pub fn argv(&self) -> Option<&[String]> {
        match &self.invocation {
            Invocation::Argv(argv) => Some(argv),
            Invocation::Sequence(_) => None,
        }
    }

    pub fn command_line(&self) -> String {
        self.invocation.command_line()
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Where the execution engine may run a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locality {
    /// Any worker.
    #[default]
    Worker,
    /// The controlling node only (needs registry or database access).
    Local,
}

/// A job rendered into target / dependency / command form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub command: String,
    pub targets: Vec<String>,
    pub dependencies: Vec<String>,
    /// Carried over from the job so the graph builder can refuse to schedule
    /// it when one of them is missing.
    pub required_inputs: Vec<String>,
    pub comment: Option<String>,
    pub locality: Locality,
}

impl Rule {
    pub fn new<T>(command: impl Into<String>, targets: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            command: command.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            dependencies: Vec::new(),
            required_inputs: Vec::new(),
            comment: None,
            locality: Locality::Worker,
        }
    }

    pub fn with_dependencies<D>(mut self, dependencies: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn into_local(mut self) -> Self {
        self.locality = Locality::Local;
        self
    }

    pub fn is_local(&self) -> bool {
        self.locality == Locality::Local
    }

    /// The command exactly as it appears in the document.
    pub fn command_line(&self) -> String {
        match self.locality {
            Locality::Worker => self.command.clone(),
            Locality::Local => format!("{LOCAL_MARKER} {}", self.command),
        }
    }

    /// Short human label used in diagnostics.
    pub fn label(&self) -> &str {
        self.comment
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.command)
    }
}

/// Anything that can be turned into a [`Rule`].
pub trait Render {
    fn render(&self) -> Rule;

    fn as_local_rule(&self) -> Rule {
        self.render().into_local()
    }
}

impl Render for Job {
    fn render(&self) -> Rule {
        Rule {
            command: self.command_line(),
            targets: self.outputs.clone(),
            dependencies: self.inputs.clone(),
            required_inputs: self.required_inputs.clone(),
            comment: self.comment.clone(),
            locality: Locality::Worker,
        }
    }
}

impl Render for Rule {
    fn render(&self) -> Rule {
        self.clone()
    }
}

/// Order-preserving dedup.
pub(crate) fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
