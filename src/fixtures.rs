#[cfg(test)]
pub mod test {
    use std::fs;

    use chrono::{DateTime, Local, TimeZone};
    use tempfile::TempDir;

    /// A temporary config directory holding `files` as `(name, content)`.
    pub fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    /// 2024-03-07 14:05:09 local time.
    pub fn sample_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 7, 14, 5, 9)
            .single()
            .unwrap()
    }

    #[test]
    fn config_dir_writes_files() {
        let dir = config_dir(&[("base.xml", "<c/>"), ("version.txt", "debug")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("version.txt")).unwrap(),
            "debug"
        );
        assert!(dir.path().join("base.xml").is_file());
    }
}
