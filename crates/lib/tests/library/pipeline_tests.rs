//! End-to-end runs of the build pipeline against fake sources and a recording runner.

use lmpcross_lib::acquire::AcquireError;
use lmpcross_lib::component::BuildError;
use lmpcross_lib::options::RawOptions;
use lmpcross_lib::pipeline::build;
use lmpcross_lib::placeholder::PlaceholderError;
use lmpcross_lib::toolchain::ToolChain;

use super::common::{RecordingRunner, TestEnv, TreeAcquirer};

#[tokio::test]
async fn serial_build_relocates_all_executables() {
  let env = TestEnv::serial();
  let ctx = env.default_context();
  let runner = RecordingRunner::default();
  let acquirer = TreeAcquirer::default();

  let report = build(&ctx, &runner, &acquirer).await.unwrap();

  let build_dir = ctx.workspace.build_dir();
  assert_eq!(build_dir.file_name().unwrap(), "tmp-64-no-no-stable");
  assert_eq!(
    report.artifacts,
    vec![
      build_dir.join("voro++.exe"),
      build_dir.join("ocl_get_devices.exe"),
      build_dir.join("lmp_serial.exe"),
    ]
  );
  assert_eq!(report.executable, build_dir.join("lmp_serial.exe"));
  assert!(report.artifacts.iter().all(|path| path.is_file()));
  assert!(build_dir.join("ffmpeg.exe").is_file());
  assert!(build_dir.join("gzip.exe").is_file());
  assert!(!report.cleaned);
  assert!(build_dir.is_dir());

  assert_eq!(acquirer.fetched().len(), 7);
  // Ten component invocations plus package selection and the final build.
  assert_eq!(runner.calls().len(), 12);
}

#[tokio::test]
async fn mpi_build_uses_mpich_and_skips_stubs() {
  let env = TestEnv::new(RawOptions {
    bits: "32".into(),
    transport: "mpi".into(),
    revision: "master".into(),
    ..RawOptions::default()
  });
  let ctx = env.default_context();
  let runner = RecordingRunner::default();

  let report = build(&ctx, &runner, &TreeAcquirer::default()).await.unwrap();

  let build_dir = ctx.workspace.build_dir();
  assert_eq!(report.executable, build_dir.join("lmp_mpi.exe"));
  assert!(!runner.dirs().iter().any(|dir| dir.ends_with("src/STUBS")));

  let calls = runner.calls();
  let (atc, _) = calls.iter().find(|(_, cwd)| cwd.ends_with("lib/atc")).unwrap();
  assert!(atc.get_args().contains(&"Makefile.mpi".to_string()));
  assert_eq!(
    atc.var("CPPFLAGS").unwrap(),
    format!(
      "-I../../src -I{}/mpich2-win32/include -DLAMMPS_SMALLSMALL",
      build_dir.display()
    )
  );
  assert!(atc.var("CC").unwrap().ends_with("i686-w64-mingw32-g++"));

  let selections: Vec<&[String]> = calls
    .iter()
    .filter(|(_, cwd)| cwd.ends_with("src"))
    .map(|(cmd, _)| cmd.get_args())
    .collect();
  assert_eq!(selections.len(), 3);
  assert_eq!(selections[1], ["yes-mpiio", "yes-user-lb"]);
  assert_eq!(selections[2].last().map(String::as_str), Some("mpi"));
}

#[tokio::test]
async fn failed_component_halts_build() {
  let env = TestEnv::serial();
  let ctx = env.default_context();
  let runner = RecordingRunner::failing_in("lib/gpu");

  let err = build(&ctx, &runner, &TreeAcquirer::default()).await.unwrap_err();

  assert!(err.to_string().contains("mpi.h: No such file or directory"));
  assert_eq!(
    err.command_output(),
    Some("fatal error: mpi.h: No such file or directory")
  );

  let dirs = runner.dirs();
  assert!(dirs.last().unwrap().ends_with("lib/gpu"));
  assert!(!dirs.iter().any(|dir| dir.ends_with("lib/linalg") || dir.ends_with("src")));
  assert!(!ctx.workspace.build_dir().join("lmp_serial.exe").exists());
  assert!(!ctx.workspace.build_dir().join("ocl_get_devices.exe").exists());
}

#[tokio::test]
async fn missing_compiler_is_reported_before_any_command() {
  let env = TestEnv::serial();
  let empty = env.temp.path().join("empty");
  std::fs::create_dir(&empty).unwrap();
  let toolchain = ToolChain::resolve_in(env.options.word_size, Some(empty.as_os_str()), &empty);
  let ctx = env.context(env.config(), toolchain);
  let runner = RecordingRunner::default();

  let err = build(&ctx, &runner, &TreeAcquirer::default()).await.unwrap_err();

  match err {
    BuildError::Placeholder(PlaceholderError::ToolNotFound { tool, program }) => {
      assert_eq!(tool, "cxx");
      assert_eq!(program, "x86_64-w64-mingw32-g++");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn acquisition_failure_runs_nothing() {
  let env = TestEnv::serial();
  let ctx = env.default_context();
  let runner = RecordingRunner::default();
  let acquirer = TreeAcquirer::failing_on("eigen");

  let err = build(&ctx, &runner, &acquirer).await.unwrap_err();

  assert!(matches!(err, BuildError::Acquire(AcquireError::Fetch { .. })));
  assert_eq!(acquirer.fetched().len(), 4);
  assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn patch_file_is_applied_in_component_dir() {
  let env = TestEnv::serial();
  let config = env.config();
  std::fs::create_dir_all(&config.patch_dir).unwrap();
  let patch = config.patch_dir.join("colvars.patch");
  std::fs::write(&patch, "--- colvarmodule.h\n+++ colvarmodule.h\n").unwrap();
  let ctx = env.context(config, env.toolchain());
  let runner = RecordingRunner::default();

  build(&ctx, &runner, &TreeAcquirer::default()).await.unwrap();

  let calls = runner.calls();
  let colvars: Vec<_> = calls.iter().filter(|(_, cwd)| cwd.ends_with("lib/colvars")).collect();
  assert_eq!(colvars.len(), 2);
  assert_eq!(colvars[0].0.program(), "patch");
  assert_eq!(colvars[0].0.get_args(), ["-p0"]);
  assert_eq!(colvars[0].0.get_stdin(), Some(patch.as_path()));
  assert_eq!(colvars[1].0.program(), "make");
  assert_eq!(calls.iter().filter(|(cmd, _)| cmd.program() == "patch").count(), 1);
}

#[tokio::test]
async fn cleanup_removes_build_dir_when_enabled() {
  let env = TestEnv::serial();
  let mut config = env.config();
  config.cleanup = true;
  let ctx = env.context(config, env.toolchain());

  let report = build(&ctx, &RecordingRunner::default(), &TreeAcquirer::default())
    .await
    .unwrap();

  assert!(report.cleaned);
  assert!(!ctx.workspace.build_dir().exists());
}

#[tokio::test]
async fn report_serializes_to_json() {
  let env = TestEnv::new(RawOptions {
    threads: "omp".into(),
    ..RawOptions::default()
  });
  let ctx = env.default_context();

  let report = build(&ctx, &RecordingRunner::default(), &TreeAcquirer::default())
    .await
    .unwrap();
  let json = serde_json::to_value(&report).unwrap();

  assert_eq!(json["options"]["word_size"], "64");
  assert_eq!(json["options"]["threads"], "omp");
  assert_eq!(json["options"]["revision"], "stable");
  assert_eq!(json["cleaned"], false);
  assert_eq!(json["artifacts"].as_array().unwrap().len(), 3);
  assert!(json["elapsed_secs"].is_f64());
}
