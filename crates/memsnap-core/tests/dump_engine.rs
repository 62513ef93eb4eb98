//! Tests for the dump engine against a scripted platform
//!
//! The platform records every primitive call so the tests can check ordering
//! (capture before dump, release after dump) and that nothing leaks.

mod common;

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use common::{FakeProcess, FakeSystem};
use memsnap_core::dump::DumpPlatform;
use memsnap_core::{
    DumpEngine, DumpStrategy, MemoryDumper, OutputSpec, ProcessId, ProcessTarget, SnapError, SnapResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call
{
    EnsureSupport,
    Open(DumpStrategy),
    WriteProcess,
    Capture,
    WriteSnapshot,
    QueryClone,
    CloneId,
    Free,
    CloseClone,
}

/// Which primitive should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Fault
{
    #[default]
    None,
    NoSnapshotSupport,
    OpenDenied,
    Capture,
    Write,
    WriteNothing,
    QueryClone,
    Free,
}

#[derive(Debug)]
struct FakeSnapshot(u32);

#[derive(Debug)]
struct FakeClone(u32);

#[derive(Default)]
struct ScriptedPlatform
{
    fault: Fault,
    calls: RefCell<Vec<Call>>,
    live_snapshots: Cell<i32>,
    live_clones: Cell<i32>,
}

impl ScriptedPlatform
{
    fn failing(fault: Fault) -> Self
    {
        Self {
            fault,
            ..Self::default()
        }
    }

    fn log(&self, call: Call)
    {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<Call>
    {
        self.calls.borrow().clone()
    }

    fn write_into(&self, pid: ProcessId, mut file: &File) -> SnapResult<()>
    {
        match self.fault {
            Fault::Write => {
                // Leave some bytes behind so deletion is really tested
                file.write_all(b"MDMP partial")?;
                Err(SnapError::DumpFailed {
                    pid,
                    details: "write failed".to_string(),
                })
            }
            Fault::WriteNothing => Ok(()),
            _ => {
                file.write_all(b"MDMP full memory")?;
                Ok(())
            }
        }
    }
}

impl DumpPlatform for ScriptedPlatform
{
    type Process = ProcessId;
    type Snapshot = FakeSnapshot;
    type CloneProcess = FakeClone;

    fn ensure_snapshot_support(&self) -> SnapResult<()>
    {
        self.log(Call::EnsureSupport);
        if self.fault == Fault::NoSnapshotSupport {
            return Err(SnapError::SnapshotUnavailable("no PssCaptureSnapshot".to_string()));
        }
        Ok(())
    }

    fn open_process(&self, pid: ProcessId, strategy: DumpStrategy) -> SnapResult<ProcessId>
    {
        self.log(Call::Open(strategy));
        if self.fault == Fault::OpenDenied {
            return Err(SnapError::PermissionDenied(format!("cannot open process {pid}")));
        }
        Ok(pid)
    }

    fn write_process_dump(&self, _process: &ProcessId, pid: ProcessId, file: &File) -> SnapResult<()>
    {
        self.log(Call::WriteProcess);
        self.write_into(pid, file)
    }

    fn capture_snapshot(&self, process: &ProcessId, pid: ProcessId) -> SnapResult<FakeSnapshot>
    {
        self.log(Call::Capture);
        if self.fault == Fault::Capture {
            return Err(SnapError::SnapshotFailed {
                pid,
                details: "capture failed".to_string(),
            });
        }
        self.live_snapshots.set(self.live_snapshots.get() + 1);
        Ok(FakeSnapshot(process.raw()))
    }

    fn write_snapshot_dump(&self, _snapshot: &FakeSnapshot, pid: ProcessId, file: &File) -> SnapResult<()>
    {
        self.log(Call::WriteSnapshot);
        self.write_into(pid, file)
    }

    fn query_clone(&self, snapshot: &FakeSnapshot) -> SnapResult<FakeClone>
    {
        self.log(Call::QueryClone);
        if self.fault == Fault::QueryClone {
            return Err(SnapError::SnapshotFailed {
                pid: ProcessId(snapshot.0),
                details: "query failed".to_string(),
            });
        }
        self.live_clones.set(self.live_clones.get() + 1);
        Ok(FakeClone(snapshot.0 + 1))
    }

    fn clone_process_id(&self, clone: &FakeClone) -> Option<ProcessId>
    {
        self.log(Call::CloneId);
        Some(ProcessId(clone.0))
    }

    fn free_snapshot(&self, _snapshot: FakeSnapshot) -> SnapResult<()>
    {
        self.log(Call::Free);
        // The snapshot is gone even when freeing reports an error
        self.live_snapshots.set(self.live_snapshots.get() - 1);
        if self.fault == Fault::Free {
            return Err(SnapError::SnapshotFailed {
                pid: ProcessId(0),
                details: "free failed".to_string(),
            });
        }
        Ok(())
    }

    fn close_clone(&self, _clone: FakeClone)
    {
        self.log(Call::CloseClone);
        self.live_clones.set(self.live_clones.get() - 1);
    }
}

fn engine(fault: Fault, strategy: DumpStrategy) -> DumpEngine<FakeSystem, ScriptedPlatform>
{
    let system = FakeSystem::new(vec![
        FakeProcess::new(4, "System"),
        FakeProcess::new(100, "notepad.exe").parent(4),
    ]);
    DumpEngine::new(system, ScriptedPlatform::failing(fault), strategy)
}

fn output_in(dir: &Path) -> OutputSpec
{
    OutputSpec::default().in_dir(dir)
}

fn assert_released(platform: &ScriptedPlatform)
{
    assert_eq!(platform.live_snapshots.get(), 0, "snapshot leaked");
    assert_eq!(platform.live_clones.get(), 0, "clone handle leaked");
}

#[test]
fn test_direct_dump_success()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Direct);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(outcome.success);
    assert_eq!(outcome.failure, None);
    assert_eq!(outcome.file_path, dir.path().join("notepad_100.dmp"));
    assert!(std::fs::metadata(&outcome.file_path).unwrap().len() > 0);
    assert_eq!(
        engine.platform().calls(),
        vec![Call::Open(DumpStrategy::Direct), Call::WriteProcess]
    );
}

#[test]
fn test_direct_dump_failure_deletes_file()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::Write, DumpStrategy::Direct);

    let outcome = engine.dump(&ProcessTarget::Name("notepad".into()), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(outcome.failure.is_some());
    assert_eq!(outcome.file_path, dir.path().join("notepad_100.dmp"));
    assert!(!outcome.file_path.exists());
}

#[test]
fn test_empty_dump_counts_as_failure()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::WriteNothing, DumpStrategy::Direct);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(!outcome.file_path.exists());
    let failure = outcome.failure.unwrap();
    assert!(failure.starts_with("Dump of PID 100 failed"), "{failure}");
    assert!(failure.contains("empty"));
}

#[test]
fn test_open_failure_creates_no_file()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::OpenDenied, DumpStrategy::Direct);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(4)), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(outcome.failure.unwrap().contains("Permission denied"));
    assert!(!dir.path().join("System_4.dmp").exists());
    assert_eq!(engine.platform().calls(), vec![Call::Open(DumpStrategy::Direct)]);
}

#[test]
fn test_snapshot_dump_success_releases_in_order()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(outcome.success);
    assert!(std::fs::metadata(&outcome.file_path).unwrap().len() > 0);
    assert_eq!(
        engine.platform().calls(),
        vec![
            Call::EnsureSupport,
            Call::Open(DumpStrategy::Snapshot),
            Call::Capture,
            Call::WriteSnapshot,
            Call::QueryClone,
            Call::CloneId,
            Call::Free,
            Call::CloseClone,
        ]
    );
    assert_released(engine.platform());
}

#[test]
fn test_capture_failure_short_circuits()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::Capture, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(!outcome.file_path.exists());
    assert_eq!(
        engine.platform().calls(),
        vec![Call::EnsureSupport, Call::Open(DumpStrategy::Snapshot), Call::Capture]
    );
    assert_released(engine.platform());
}

#[test]
fn test_snapshot_dump_failure_still_releases()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::Write, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(!outcome.file_path.exists());
    let calls = engine.platform().calls();
    let write = calls.iter().position(|c| *c == Call::WriteSnapshot).unwrap();
    let free = calls.iter().position(|c| *c == Call::Free).unwrap();
    let close = calls.iter().position(|c| *c == Call::CloseClone).unwrap();
    assert!(write < free && free < close);
    assert_released(engine.platform());
}

#[test]
fn test_clone_query_failure_still_frees()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::QueryClone, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    // Release problems are logged, the dump itself succeeded
    assert!(outcome.success);
    let calls = engine.platform().calls();
    assert_eq!(calls.iter().filter(|c| **c == Call::Free).count(), 1);
    assert!(!calls.contains(&Call::CloseClone));
    assert_released(engine.platform());
}

#[test]
fn test_free_failure_does_not_fail_dump()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::Free, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(outcome.success);
    assert!(engine.platform().calls().contains(&Call::CloseClone));
    assert_released(engine.platform());
}

#[test]
fn test_missing_snapshot_support_fails_fast()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::NoSnapshotSupport, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));

    assert!(!outcome.success);
    assert!(!outcome.file_path.exists());
    assert_eq!(engine.platform().calls(), vec![Call::EnsureSupport]);
}

#[test]
fn test_unknown_targets_leave_no_file()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Direct);

    for target in [ProcessTarget::Id(ProcessId(31337)), ProcessTarget::Name("ghost.exe".into())] {
        let outcome = engine.dump(&target, &output_in(dir.path()));
        assert!(!outcome.success);
        assert!(outcome.file_path.as_os_str().is_empty());
    }
    assert!(engine.platform().calls().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_name_with_and_without_exe_dump_the_same_process()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Direct);

    let bare = engine.dump(&ProcessTarget::Name("notepad".into()), &output_in(dir.path()));
    let suffixed = engine.dump(&ProcessTarget::Name("notepad.exe".into()), &output_in(dir.path()));

    assert!(bare.success && suffixed.success);
    assert_eq!(bare.file_path, suffixed.file_path);
}

#[test]
fn test_explicit_file_name()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Direct);

    let output = output_in(dir.path()).named("custom.dmp");
    let outcome = engine.dump_process_via_snapshot(&ProcessTarget::Id(ProcessId(100)), &output);

    assert!(outcome.success);
    assert_eq!(outcome.file_path, dir.path().join("custom.dmp"));
    // The explicit entry point overrides the engine's configured strategy
    assert!(engine.platform().calls().contains(&Call::Capture));
}

#[test]
fn test_repeated_snapshot_dumps_do_not_leak()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::None, DumpStrategy::Snapshot);

    for _ in 0..5 {
        let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));
        assert!(outcome.success);
        assert_released(engine.platform());
    }
    let captures = engine.platform().calls().iter().filter(|c| **c == Call::Capture).count();
    let frees = engine.platform().calls().iter().filter(|c| **c == Call::Free).count();
    assert_eq!(captures, 5);
    assert_eq!(frees, 5);
}

#[test]
fn test_outcome_serializes()
{
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(Fault::Capture, DumpStrategy::Snapshot);

    let outcome = engine.dump(&ProcessTarget::Id(ProcessId(100)), &output_in(dir.path()));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["failure"].as_str().unwrap().contains("capture failed"));
}
