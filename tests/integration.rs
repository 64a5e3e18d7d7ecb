use std::{fs, path::PathBuf, process::Command, process::Output};

fn run_bin(args: &[&str]) -> Output {
    run_bin_logging(args, "info")
}

fn run_bin_logging(args: &[&str], rust_log: &str) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_meanbench"));

    Command::new(bin)
        .args(args)
        .env("RUST_LOG", rust_log)
        .output()
        .expect("failed to execute command")
}

fn stdout_of(args: &[&str]) -> String {
    let output = run_bin(args);

    let stdout_str =
        String::from_utf8(output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        String::from_utf8(output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );

    stdout_str
}

fn parse_average(stdout: &str) -> f64 {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("average = "))
        .expect("missing average line")
        .parse()
        .expect("failed to parse average")
}

#[test]
fn basic_run() {
    let stdout = stdout_of(&["--len", "100000", "--seed", "1"]);
    let lines: Vec<_> = stdout.lines().collect();

    assert_eq!(lines.len(), 4, "{stdout}");
    let average = parse_average(&stdout);
    assert!((-100.0..100.0).contains(&average));
    assert!(lines[1].starts_with("Data creation: ") && lines[1].ends_with(" seconds"));
    assert!(lines[2].starts_with("Averaging:     "));
    assert!(lines[3].starts_with("Total:         "));
}

#[test]
fn seeded_strategies_agree() {
    let mut averages = Vec::new();
    for summation in ["naive", "unrolled", "pairwise", "kahan", "streaming"] {
        let stdout = stdout_of(&[
            "--len",
            "10007",
            "--seed",
            "11",
            "--summation",
            summation,
            "--no-timing",
        ]);
        assert_eq!(stdout.lines().count(), 1);
        averages.push(parse_average(&stdout));
    }

    for average in &averages {
        assert!((average - averages[0]).abs() < 1e-9, "{averages:?}");
    }
}

#[test]
fn aligned_run_reports_alignment() {
    let stdout = stdout_of(&["--len", "1001", "--aligned", "--lanes", "16", "--no-timing"]);
    assert!(stdout.lines().any(|line| line == "alignment = 0"), "{stdout}");
}

#[test]
fn config_file_is_loaded() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("config_file_is_loaded");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir_all(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "[sample]\n"
        + "len = 4096\n"
        + "low = 10.0\n"
        + "high = 20.0\n"
        + "seed = 5\n"
        + "\n"
        + "[summation]\n"
        + "method = \"kahan\"\n"
        + "\n"
        + "[output]\n"
        + "timing = false\n"
        + "runs = 2\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    let config_path_str = config_path
        .to_str()
        .expect("failed to convert config path to string");

    let stdout = stdout_of(&["--config", config_path_str]);
    assert_eq!(stdout.matches("average = ").count(), 2, "{stdout}");
    for line in stdout.lines().filter(|line| line.starts_with("average = ")) {
        let average = parse_average(line);
        assert!((10.0..20.0).contains(&average));
    }

    // Flags override the file.
    let stdout = stdout_of(&["--config", config_path_str, "--runs", "1"]);
    assert_eq!(stdout.lines().count(), 1, "{stdout}");

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn comparison_mode() {
    let stdout = stdout_of(&["--len", "5000", "--seed", "2", "--compare"]);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 5, "{stdout}");
    assert!(lines.iter().all(|line| line.contains("seconds")));

    let stdout = stdout_of(&["--len", "1000", "--seed", "1", "--compare", "--runs", "5"]);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 5, "{stdout}");
    assert!(lines[0].starts_with("naive") && lines[0].contains("relative = 1.00x"));
    assert!(lines.iter().all(|line| line.contains("std_dev = ")), "{stdout}");
}

#[test]
fn allocation_failure_exits_with_one() {
    for rust_log in ["info", "off", "warn,meanbench=off"] {
        let output = run_bin_logging(&["--len", "4611686018427387904"], rust_log);
        let stderr_str = String::from_utf8_lossy(&output.stderr);

        assert_eq!(output.status.code(), Some(1), "RUST_LOG={rust_log}");
        assert!(
            stderr_str.contains("Memory allocation failed"),
            "RUST_LOG={rust_log}\nstderr:\n{stderr_str}"
        );
        assert!(output.stdout.is_empty());
    }
}

#[test]
fn invalid_arguments_exit_with_error() {
    let cases: [&[&str]; 5] = [
        &["--len", "0"],
        &["--lanes", "3"],
        &["--low", "5", "--high", "-5"],
        &["--runs", "0"],
        &["--len", "3", "--low", "1e308", "--high", "1.7e308"],
    ];
    for args in cases {
        let output = run_bin(args);
        assert_eq!(output.status.code(), Some(1), "{args:?}");
    }
}

#[test]
fn help_describes_every_flag() {
    let stdout = stdout_of(&["--help"]);
    assert!(stdout.contains("Order in which the samples are added up"), "{stdout}");
    assert!(stdout.contains("Print only the average, without phase timings"));
}
