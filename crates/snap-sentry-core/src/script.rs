use crate::render::Section;
use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const SEPARATOR: &str = "----------";

/// Shell script handed to the operator: summary echoes, then either the
/// confirmation gate or an abort notice.
pub struct ContinuationScript {
    snapraid_binary: String,
    snapraid_config: String,
    body: String,
}

impl ContinuationScript {
    pub fn new(snapraid_binary: &str, snapraid_config: &str) -> Self {
        let mut body = String::from("#!/bin/sh\n");
        body.push_str(&format!(
            "# generated by snap-sentry at {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        Self {
            snapraid_binary: snapraid_binary.to_string(),
            snapraid_config: snapraid_config.to_string(),
            body,
        }
    }

    /// Echo every line of the section, then a separator.
    pub fn push_section(&mut self, section: &Section) {
        for line in &section.lines {
            self.push_echo(line);
        }
        self.push_echo(SEPARATOR);
    }

    fn push_echo(&mut self, text: &str) {
        self.body.push_str("echo ");
        self.body.push_str(&quote(text));
        self.body.push('\n');
    }

    /// Append the interactive gate running touch, sync and scrub.
    pub fn finish_with_gate(mut self) -> String {
        let tool = format!(
            "{} --conf {}",
            quote(&self.snapraid_binary),
            quote(&self.snapraid_config)
        );
        self.body.push_str(&format!(
            r#"
printf "Continue (y/n)? "
read CONT
if [ "$CONT" = "y" ]; then
  {tool} touch &&
  {tool} sync &&
  {tool} scrub -p new
else
  echo "abort the mission"
fi
"#
        ));
        self.body
    }

    /// Close the script without any destructive command.
    pub fn finish_aborted(mut self) -> String {
        self.push_echo("Sync aborted: too many unexplained deletions.");
        self.push_echo("Review the list above, then run again with --ignore-delete-threshold");
        self.body.push_str("exit 1\n");
        self.body
    }
}

fn quote(text: &str) -> Cow<'_, str> {
    match shlex::try_quote(text) {
        Ok(quoted) => quoted,
        Err(_) => Cow::Owned(
            shlex::try_quote(&text.replace('\0', ""))
                .map(Cow::into_owned)
                .unwrap_or_default(),
        ),
    }
}

/// Write the script and mark it executable.
pub fn write_script(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(lines: &[&str]) -> Section {
        Section {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_echo_lines_are_quoted() {
        let mut script = ContinuationScript::new("snapraid", "/etc/snapraid.conf");
        script.push_section(&section(&["Deleted 1 important files are:", "- RAID/$(rm -rf x).txt"]));
        let text = script.finish_with_gate();

        assert!(text.starts_with("#!/bin/sh\n"));
        assert!(text.contains("echo 'Deleted 1 important files are:'\n"));
        assert!(text.contains("echo '- RAID/$(rm -rf x).txt'\n"));
        assert!(text.contains("----------"));
    }

    #[test]
    fn test_gate_runs_touch_sync_scrub_in_order() {
        let text = ContinuationScript::new("/usr/local/bin/snapraid", "/etc/snapraid.conf")
            .finish_with_gate();
        let touch = text.find("snapraid.conf touch").unwrap();
        let sync = text.find("snapraid.conf sync").unwrap();
        let scrub = text.find("snapraid.conf scrub -p new").unwrap();
        assert!(touch < sync && sync < scrub);
        assert!(text.contains("if [ \"$CONT\" = \"y\" ]; then"));
    }

    #[test]
    fn test_aborted_script_has_no_sync() {
        let mut script = ContinuationScript::new("snapraid", "/etc/snapraid.conf");
        script.push_section(&section(&["Aborting"]));
        let text = script.finish_aborted();
        assert!(!text.contains(" sync"));
        assert!(!text.contains("read CONT"));
        assert!(text.trim_end().ends_with("exit 1"));
    }

    #[test]
    fn test_write_script_is_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/snap.sh");
        write_script(&path, "#!/bin/sh\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
