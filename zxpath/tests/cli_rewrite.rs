#[cfg(test)]
mod test {
    use assert_cmd::Command;
    use predicates::str::contains;
    use rstest::{fixture, rstest};

    const LINE: &str = "test_files/line.json";
    const CLAW: &str = "test_files/claw.json";

    #[fixture]
    fn cmd() -> Command {
        let mut cmd = Command::cargo_bin("zxpath").unwrap();
        cmd.arg("rewrite");
        cmd
    }

    #[rstest]
    #[case::local_comp(CLAW, &["local-comp", "c"], "local_comp: applies")]
    #[case::not_half_pi(CLAW, &["local-comp", "n1"], "local_comp: does not apply")]
    #[case::expand(LINE, &["expand-hadamard", "e1"], "expand_hadamard_edge: applies")]
    #[case::fuse_boundary(LINE, &["fuse", "z1"], "fuse_degree2_spider: does not apply")]
    #[case::split(CLAW, &["split", "--edges", "e4,e5"], "split_spider: applies")]
    #[case::rev_pivot(
        CLAW,
        &["rev-pivot", "--u-side", "n1,n2", "--v-side", "n2,n3"],
        "reverse_pivot_finish: applies"
    )]
    fn dry_run(
        mut cmd: Command,
        #[case] file: &str,
        #[case] rule: &[&str],
        #[case] expected: &str,
    ) {
        cmd.arg(file)
            .arg("--dry-run")
            .args(rule)
            .assert()
            .success()
            .stdout(contains(expected));
    }

    #[rstest]
    fn expand_then_check(mut cmd: Command) {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("expanded.json");
        cmd.arg(LINE)
            .arg("-o")
            .arg(&out)
            .args(["expand-hadamard", "e1", "--color", "x"])
            .assert()
            .success()
            .stdout(contains("expand_hadamard_edge: added nodes"));

        Command::cargo_bin("zxpath")
            .unwrap()
            .arg("check")
            .arg(&out)
            .assert()
            .success()
            .stdout(contains("nodes: 6"))
            .stdout(contains("edges: 5"))
            .stdout(contains("paths: 1"));
    }

    #[rstest]
    fn local_comp_to_stdout(mut cmd: Command) {
        cmd.arg(CLAW)
            .args(["local-comp", "c"])
            .assert()
            .success()
            .stdout(contains("\"nodes\""))
            .stdout(contains("\"zxAngle\": \"-π/2\""))
            .stdout(contains("\"paths\""));
    }

    #[rstest]
    fn rev_local_comp_with_negative_phase(mut cmd: Command) {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hub.json");
        cmd.arg(CLAW)
            .arg("--out")
            .arg(&out)
            .args(["rev-local-comp", "n1", "n2", "--phase", "-π/2"])
            .assert()
            .success()
            .stdout(contains("reverse_local_comp: added"));
    }

    #[rstest]
    fn precondition_failure(mut cmd: Command) {
        cmd.arg(LINE)
            .args(["pivot", "e0"])
            .assert()
            .failure()
            .stderr(contains("Rewrite failed"))
            .stderr(contains("not a Hadamard edge"));
    }

    #[rstest]
    fn unknown_node(mut cmd: Command) {
        cmd.arg(CLAW)
            .args(["local-comp", "nope"])
            .assert()
            .failure()
            .stderr(contains("No node named \"nope\""));
    }
}
