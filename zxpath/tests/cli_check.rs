#[cfg(test)]
mod test {
    use assert_cmd::Command;
    use predicates::str::contains;
    use rstest::{fixture, rstest};
    use std::fs;

    const LINE: &str = "test_files/line.json";
    const CLAW: &str = "test_files/claw.json";

    #[fixture]
    fn cmd() -> Command {
        let mut cmd = Command::cargo_bin("zxpath").unwrap();
        cmd.arg("check");
        cmd
    }

    #[rstest]
    fn line(mut cmd: Command) {
        cmd.arg(LINE)
            .assert()
            .success()
            .stdout(contains("nodes: 4"))
            .stdout(contains("edges: 3"))
            .stdout(contains("paths: 1"))
            .stdout(contains("path p: b0 -> z1 -> z2 -> b3"));
    }

    #[rstest]
    fn claw(mut cmd: Command) {
        cmd.arg(CLAW)
            .assert()
            .success()
            .stdout(contains("nodes: 7"))
            .stdout(contains("path left-right: b1 -> n1 -> c -> n2 -> b2"));
    }

    #[rstest]
    fn broken_path(mut cmd: Command) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(
            &file,
            r#"{"nodes": {"a": {"zxType": "boundary"}, "b": {"zxType": "z"}},
                "edges": {"e": {"source": "a", "target": "b"}},
                "paths": {"p": {"edges": ["e"]}}}"#,
        )
        .unwrap();
        cmd.arg(&file)
            .assert()
            .failure()
            .stderr(contains("path ends must be boundary nodes"));
    }

    #[rstest]
    fn pending_reverse_pivot(mut cmd: Command) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hub.json");
        fs::write(
            &file,
            r#"{"nodes": {"h": {"zxType": "pivotA"}, "z": {"zxType": "z"}},
                "edges": {"e": {"source": "h", "target": "z", "zxType": "hadamard"}}}"#,
        )
        .unwrap();
        cmd.arg(&file)
            .assert()
            .success()
            .stdout(contains("node h is an unfinished reverse pivot"));
    }

    #[rstest]
    fn phase_out_of_range(mut cmd: Command) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("phase.json");
        fs::write(
            &file,
            r#"{"nodes": {"z": {"zxType": "z",
                "zxAngle": "π/4611686018427387904+π/4611686018427387903"}}}"#,
        )
        .unwrap();
        cmd.arg(&file)
            .assert()
            .failure()
            .stderr(contains("Error reading diagram"))
            .stderr(contains("out of range"));
    }

    #[rstest]
    fn doesnt_exist(mut cmd: Command) {
        cmd.arg("blah.json")
            .assert()
            .failure()
            .stderr(contains("Error reading diagram"));
    }
}
