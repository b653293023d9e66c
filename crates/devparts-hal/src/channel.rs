//! Transports for raw setting values
//!
//! A channel moves raw text between a setting and the hardware. Reads never
//! fail hard: any launch error, non-zero exit or I/O error is logged and
//! reported as `None`. Writes report `true` only when the hardware side
//! accepted the value.

use crate::executor::{CommandExecutor, shell_argv, shell_quote};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run argv and return stdout lines when it exits 0
fn run_for_output(executor: &dyn CommandExecutor, argv: &[String]) -> Option<Vec<String>> {
    match executor.run(argv) {
        Ok(out) if out.success() => Some(out.stdout),
        Ok(out) => {
            tracing::warn!(
                "`{}` exited with {}: {}",
                argv.join(" "),
                out.exit_code,
                out.stderr
            );
            None
        }
        Err(e) => {
            tracing::error!("{}", e);
            None
        }
    }
}

/// Run argv and report whether it exited 0
fn run_for_status(executor: &dyn CommandExecutor, argv: &[String]) -> bool {
    run_for_output(executor, argv).is_some()
}

/// Privileged single-shot overwrite of `path` with one line per entry
fn overwrite_command(path: &Path, lines: &[String]) -> Vec<String> {
    let words: Vec<String> = lines.iter().map(|l| shell_quote(l)).collect();
    shell_argv(format!(
        "printf '%s\\n' {} > {}",
        words.join(" "),
        shell_quote(&path.to_string_lossy())
    ))
}

/// Pull `key=value` pairs for `keys` out of config file lines.
///
/// Keys are matched case-sensitively at the start of a line and must be
/// followed directly by `=`. The first occurrence of a key wins.
pub fn parse_key_values<S: AsRef<str>>(lines: &[S], keys: &[String]) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in lines {
        let line = line.as_ref();
        for key in keys {
            let Some(value) = line.strip_prefix(key.as_str()).and_then(|r| r.strip_prefix('='))
            else {
                continue;
            };
            values
                .entry(key.clone())
                .or_insert_with(|| value.trim().to_string());
        }
    }

    values
}

/// One key of a root-owned `key=value` file shared with sibling keys
#[derive(Clone)]
pub struct ConfigFileChannel {
    executor: Arc<dyn CommandExecutor>,
    path: PathBuf,
    key: String,
    managed_keys: Vec<String>,
}

impl ConfigFileChannel {
    /// `managed_keys` lists every key the file holds, in file order; `key` must be one of them
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        managed_keys: Vec<String>,
    ) -> Self {
        let key = key.into();
        let mut managed_keys = managed_keys;
        if !managed_keys.contains(&key) {
            managed_keys.push(key.clone());
        }
        Self {
            executor,
            path: path.into(),
            key,
            managed_keys,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn cat_command(&self) -> Vec<String> {
        vec!["cat".to_string(), self.path.to_string_lossy().to_string()]
    }

    /// Current values of every managed key
    fn read_all(&self) -> Option<HashMap<String, String>> {
        let lines = run_for_output(self.executor.as_ref(), &self.cat_command())?;
        Some(parse_key_values(&lines, &self.managed_keys))
    }

    /// Whether the file exists, checked with root privileges
    fn file_exists(&self) -> Option<bool> {
        let argv = vec![
            "test".to_string(),
            "-e".to_string(),
            self.path.to_string_lossy().to_string(),
        ];
        match self.executor.run(&argv) {
            Ok(out) => Some(out.success()),
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }

    pub fn read(&self) -> Option<String> {
        let mut values = self.read_all()?;
        let value = values.remove(&self.key);
        if value.is_none() {
            tracing::warn!("Key {} not present in {}", self.key, self.path.display());
        }
        value
    }

    /// Rewrite the whole file, keeping sibling keys at their current values
    pub fn write(&self, raw: &str) -> bool {
        let current = match self.read_all() {
            Some(values) => values,
            None => match self.file_exists() {
                Some(false) => {
                    tracing::info!("{} does not exist yet, creating it", self.path.display());
                    HashMap::new()
                }
                _ => {
                    tracing::error!(
                        "Unable to read {} before writing {}, refusing to clobber it",
                        self.path.display(),
                        self.key
                    );
                    return false;
                }
            },
        };

        let lines: Vec<String> = self
            .managed_keys
            .iter()
            .filter_map(|k| {
                if *k == self.key {
                    Some(format!("{}={}", k, raw))
                } else {
                    current.get(k).map(|v| format!("{}={}", k, v))
                }
            })
            .collect();

        let ok = run_for_status(
            self.executor.as_ref(),
            &overwrite_command(&self.path, &lines),
        );
        if !ok {
            tracing::error!("Unable to write {}={} to {}", self.key, raw, self.path.display());
        }
        ok
    }
}

/// Vendor helper binary queried with `get` arguments and driven with `set` arguments
#[derive(Clone)]
pub struct ShellHelperChannel {
    executor: Arc<dyn CommandExecutor>,
    helper: PathBuf,
    get_args: Vec<String>,
    set_args: Vec<String>,
}

impl ShellHelperChannel {
    /// `<helper> get <name>` / `<helper> set <name> <value>`
    pub fn subcommand(
        executor: Arc<dyn CommandExecutor>,
        helper: impl Into<PathBuf>,
        name: &str,
    ) -> Self {
        Self::with_args(
            executor,
            helper,
            vec!["get".to_string(), name.to_string()],
            vec!["set".to_string(), name.to_string()],
        )
    }

    /// Arbitrary argument prefixes; the raw value is appended to `set_args`
    pub fn with_args(
        executor: Arc<dyn CommandExecutor>,
        helper: impl Into<PathBuf>,
        get_args: Vec<String>,
        set_args: Vec<String>,
    ) -> Self {
        Self {
            executor,
            helper: helper.into(),
            get_args,
            set_args,
        }
    }

    pub fn helper(&self) -> &Path {
        &self.helper
    }

    fn argv(&self, args: &[String]) -> Vec<String> {
        std::iter::once(self.helper.to_string_lossy().to_string())
            .chain(args.iter().cloned())
            .collect()
    }

    pub fn read(&self) -> Option<String> {
        let argv = self.argv(&self.get_args);
        let lines = run_for_output(self.executor.as_ref(), &argv)?;
        match lines.into_iter().next() {
            Some(line) => Some(line.trim().to_string()),
            None => {
                tracing::warn!("`{}` printed nothing", argv.join(" "));
                None
            }
        }
    }

    /// Success is exit code 0; stdout is ignored
    pub fn write(&self, raw: &str) -> bool {
        let mut argv = self.argv(&self.set_args);
        argv.push(raw.to_string());
        let ok = run_for_status(self.executor.as_ref(), &argv);
        if !ok {
            tracing::error!("Unable to set {} via {}", raw, self.helper.display());
        }
        ok
    }
}

/// Kernel sysfs node: plain read, privileged write
#[derive(Clone)]
pub struct SysfsChannel {
    executor: Arc<dyn CommandExecutor>,
    path: PathBuf,
}

impl SysfsChannel {
    pub fn new(executor: Arc<dyn CommandExecutor>, path: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First line of the node, without privilege escalation
    pub fn read(&self) -> Option<String> {
        let result = File::open(&self.path).and_then(|f| {
            let mut line = String::new();
            let n = BufReader::new(f).read_line(&mut line)?;
            Ok((n > 0).then(|| line.trim_end_matches(['\n', '\r']).to_string()))
        });

        match result {
            Ok(Some(line)) => Some(line),
            Ok(None) => {
                tracing::warn!("{} is empty", self.path.display());
                None
            }
            Err(e) => {
                tracing::error!("Unable to read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn write(&self, raw: &str) -> bool {
        let ok = run_for_status(
            self.executor.as_ref(),
            &overwrite_command(&self.path, &[raw.to_string()]),
        );
        if !ok {
            tracing::error!("Error writing {} to {}", raw, self.path.display());
        }
        ok
    }
}

/// The mechanism behind one device setting
#[derive(Clone)]
pub enum SettingChannel {
    ConfigFile(ConfigFileChannel),
    ShellHelper(ShellHelperChannel),
    Sysfs(SysfsChannel),
}

impl SettingChannel {
    pub fn read(&self) -> Option<String> {
        match self {
            SettingChannel::ConfigFile(c) => c.read(),
            SettingChannel::ShellHelper(c) => c.read(),
            SettingChannel::Sysfs(c) => c.read(),
        }
    }

    pub fn write(&self, raw: &str) -> bool {
        match self {
            SettingChannel::ConfigFile(c) => c.write(raw),
            SettingChannel::ShellHelper(c) => c.write(raw),
            SettingChannel::Sysfs(c) => c.write(raw),
        }
    }

    /// File or command this channel talks to, for log and error messages
    pub fn target(&self) -> String {
        match self {
            SettingChannel::ConfigFile(c) => format!("{}:{}", c.path.display(), c.key),
            SettingChannel::ShellHelper(c) => c.argv(&c.get_args).join(" "),
            SettingChannel::Sysfs(c) => c.path.display().to_string(),
        }
    }
}

impl fmt::Debug for SettingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SettingChannel::ConfigFile(_) => "ConfigFile",
            SettingChannel::ShellHelper(_) => "ShellHelper",
            SettingChannel::Sysfs(_) => "Sysfs",
        };
        write!(f, "{}({})", kind, self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PrivilegedExecutor;
    use crate::mock::MockExecutor;
    use std::fs;

    fn keys() -> Vec<String> {
        vec!["preview_mode".to_string(), "rotation_mode".to_string()]
    }

    fn direct() -> Arc<dyn CommandExecutor> {
        Arc::new(PrivilegedExecutor::direct())
    }

    #[test]
    fn test_parse_key_values() {
        let lines = ["preview_mode=1", "rotation_mode=90", "other=5"];
        let values = parse_key_values(&lines, &keys());
        assert_eq!(values.get("preview_mode").map(String::as_str), Some("1"));
        assert_eq!(values.get("rotation_mode").map(String::as_str), Some("90"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_parse_first_match_wins() {
        let lines = ["preview_mode=2", "preview_mode=0"];
        let values = parse_key_values(&lines, &keys());
        assert_eq!(values.get("preview_mode").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_requires_equals_after_key() {
        let lines = ["preview_mode_old=2", "Preview_mode=1", " preview_mode=1"];
        let values = parse_key_values(&lines, &keys());
        assert!(values.is_empty());
    }

    #[test]
    fn test_config_file_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "preview_mode=1\nrotation_mode=90\n").unwrap();

        let preview = ConfigFileChannel::new(direct(), &path, "preview_mode", keys());
        let rotation = ConfigFileChannel::new(direct(), &path, "rotation_mode", keys());
        assert_eq!(preview.read().as_deref(), Some("1"));
        assert_eq!(rotation.read().as_deref(), Some("90"));
    }

    #[test]
    fn test_config_file_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "rotation_mode=90\n").unwrap();

        let preview = ConfigFileChannel::new(direct(), &path, "preview_mode", keys());
        assert_eq!(preview.read(), None);
    }

    #[test]
    fn test_config_file_write_keeps_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "preview_mode=1\nrotation_mode=90\n").unwrap();

        let preview = ConfigFileChannel::new(direct(), &path, "preview_mode", keys());
        assert!(preview.write("0"));

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "preview_mode=0\nrotation_mode=90\n");
    }

    #[test]
    fn test_config_file_write_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");

        let rotation = ConfigFileChannel::new(direct(), &path, "rotation_mode", keys());
        assert!(rotation.write("180"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "rotation_mode=180\n");
    }

    #[test]
    fn test_config_file_refuses_blind_overwrite() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond("cat", 1, "");
        mock.respond("test", 0, "");

        let channel = ConfigFileChannel::new(mock.clone(), "/data/cfg", "preview_mode", keys());
        assert!(!channel.write("2"));
        // no sh -c overwrite was attempted
        assert!(mock.calls().iter().all(|argv| argv[0] != "sh"));
    }

    #[test]
    fn test_shell_helper_read_first_line() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond("/system/bin/camera_config", 0, "90\nignored\n");

        let channel = ShellHelperChannel::subcommand(mock.clone(), "/system/bin/camera_config", "rotation");
        assert_eq!(channel.read().as_deref(), Some("90"));
        assert_eq!(
            mock.calls()[0],
            vec!["/system/bin/camera_config", "get", "rotation"]
        );
    }

    #[test]
    fn test_shell_helper_read_failure() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond("helper", 1, "0");
        let channel = ShellHelperChannel::subcommand(mock, "helper", "rotation");
        assert_eq!(channel.read(), None);

        let missing = Arc::new(MockExecutor::new());
        let channel = ShellHelperChannel::subcommand(missing, "helper", "rotation");
        assert_eq!(channel.read(), None);
    }

    #[test]
    fn test_shell_helper_write_uses_exit_code() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond("ts_srv_set", 0, "Touchscreen set for stylus mode");
        let channel =
            ShellHelperChannel::with_args(mock.clone(), "ts_srv_set", vec!["G".into()], vec![]);
        assert!(channel.write("S"));
        assert_eq!(mock.calls()[0], vec!["ts_srv_set", "S"]);

        mock.respond("ts_srv_set", 1, "");
        assert!(!channel.write("F"));
    }

    #[test]
    fn test_sysfs_read_first_line_unprivileged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("currentlimit");
        fs::write(&path, "current500ma\nsecond\n").unwrap();

        let mock = Arc::new(MockExecutor::new());
        let channel = SysfsChannel::new(mock.clone(), &path);
        assert_eq!(channel.read().as_deref(), Some("current500ma"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_sysfs_read_missing_file() {
        let channel = SysfsChannel::new(direct(), "/nonexistent/currentlimit");
        assert_eq!(channel.read(), None);
    }

    #[test]
    fn test_sysfs_write_goes_through_executor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("currentlimit");
        fs::write(&path, "currentnone\n").unwrap();

        let channel = SysfsChannel::new(direct(), &path);
        assert!(channel.write("current1000ma"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "current1000ma\n");
    }

    #[test]
    fn test_setting_channel_target() {
        let channel = SettingChannel::Sysfs(SysfsChannel::new(direct(), "/sys/power/charger/currentlimit"));
        assert_eq!(channel.target(), "/sys/power/charger/currentlimit");
        assert_eq!(
            format!("{:?}", channel),
            "Sysfs(/sys/power/charger/currentlimit)"
        );
    }
}
