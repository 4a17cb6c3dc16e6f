//! Shell command construction for operations the sandbox API lacks.

/// Quote `value` so a POSIX shell sees it as exactly one literal word.
///
/// The value is wrapped in single quotes; embedded single quotes become
/// `'\''`. Inside single quotes no character is special, so no path can
/// terminate the word early or introduce additional syntax.
pub fn escape_arg(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// `test` predicates used for existence probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFlag {
    Exists,
    File,
    Dir,
}

impl TestFlag {
    fn as_flag(self) -> &'static str {
        match self {
            TestFlag::Exists => "-e",
            TestFlag::File => "-f",
            TestFlag::Dir => "-d",
        }
    }
}

pub fn mv(src: &str, dst: &str) -> String {
    format!("mv -- {} {}", escape_arg(src), escape_arg(dst))
}

pub fn test(flag: TestFlag, path: &str) -> String {
    format!("test {} {}", flag.as_flag(), escape_arg(path))
}

pub fn rm(path: &str, recursive: bool) -> String {
    if recursive {
        format!("rm -rf -- {}", escape_arg(path))
    } else {
        format!("rm -- {}", escape_arg(path))
    }
}
