//! Tests for process listing and target resolution

mod common;

use common::{FakeProcess, FakeSystem};
use memsnap_core::resolver::{get_parent_process_id, get_process_owner};
use memsnap_core::{list_processes, resolve_target, MachineArchitecture, ProcessId, ProcessTarget, SnapError};

#[test]
fn test_parent_scenario()
{
    // System (pid 4) has no resolvable parent; its child does
    let system = FakeSystem::new(vec![
        FakeProcess::new(100, "smss.exe").parent(4).path("C:\\Windows\\System32\\smss.exe"),
        FakeProcess::new(4, "System"),
    ]);

    let records = list_processes(&system).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].pid, ProcessId(4));
    assert_eq!(records[0].parent_pid, 0);
    assert_eq!(records[1].pid, ProcessId(100));
    assert_eq!(records[1].parent_pid, 4);
    assert_eq!(records[1].executable_path, "C:\\Windows\\System32\\smss.exe");
}

#[test]
fn test_listing_is_sorted_by_pid()
{
    let system = FakeSystem::new(vec![
        FakeProcess::new(900, "c.exe"),
        FakeProcess::new(8, "a.exe"),
        FakeProcess::new(512, "b.exe"),
        FakeProcess::new(64, "d.exe"),
    ]);

    let records = list_processes(&system).unwrap();
    assert!(records.windows(2).all(|pair| pair[0].pid <= pair[1].pid));
}

#[test]
fn test_unresolvable_fields_default()
{
    let system = FakeSystem::new(vec![FakeProcess::new(77, "protected.exe").path("C:\\hidden.exe")]);

    let record = &list_processes(&system).unwrap()[0];
    assert_eq!(record.parent_pid, 0);
    assert_eq!(record.owner_account, "");
    assert_eq!(record.session_id, 0);
    // No parent means the path is not attempted at all
    assert_eq!(record.executable_path, "");
    assert_eq!(record.architecture, MachineArchitecture::X64);
}

#[test]
fn test_resolved_fields()
{
    let system = FakeSystem::new(vec![FakeProcess::new(1200, "explorer.exe")
        .parent(1100)
        .owner("DESKTOP\\alice")
        .session(1)
        .path("C:\\Windows\\explorer.exe")]);

    let record = &list_processes(&system).unwrap()[0];
    assert_eq!(record.owner_account, "DESKTOP\\alice");
    assert_eq!(record.session_id, 1);
    assert_eq!(record.name, "explorer.exe");
}

#[test]
fn test_wow64_process_is_x86()
{
    let system = FakeSystem::new(vec![
        FakeProcess::new(10, "native.exe"),
        FakeProcess::new(11, "legacy32.exe").wow64(),
    ]);

    let records = list_processes(&system).unwrap();
    assert_eq!(records[0].architecture, MachineArchitecture::X64);
    assert_eq!(records[1].architecture, MachineArchitecture::X86);
}

#[test]
fn test_32bit_machine_ignores_emulation()
{
    let mut system = FakeSystem::new(vec![FakeProcess::new(10, "app.exe").wow64()]);
    system.machine = Some(MachineArchitecture::X86);

    let records = list_processes(&system).unwrap();
    assert_eq!(records[0].architecture, MachineArchitecture::X86);
}

#[test]
fn test_unreadable_table_is_fatal()
{
    let mut system = FakeSystem::new(vec![FakeProcess::new(4, "System")]);
    system.table_unreadable = true;

    assert!(list_processes(&system).is_err());
}

#[test]
fn test_resolver_sentinels()
{
    let system = FakeSystem::new(vec![FakeProcess::new(4, "System")]);
    assert_eq!(get_parent_process_id(&system, ProcessId(4)), 0);
    assert_eq!(get_parent_process_id(&system, ProcessId(999_999)), 0);
    assert_eq!(get_process_owner(&system, ProcessId(4)), "");
}

#[test]
fn test_resolve_by_id()
{
    let system = FakeSystem::new(vec![FakeProcess::new(612, "lsass.exe")]);

    let entry = resolve_target(&system, &ProcessTarget::Id(ProcessId(612))).unwrap();
    assert_eq!(entry.name, "lsass.exe");

    let err = resolve_target(&system, &ProcessTarget::Id(ProcessId(613))).unwrap_err();
    assert!(matches!(err, SnapError::ProcessNotFound(613)));
}

#[test]
fn test_resolve_by_name_ignores_exe_and_case()
{
    let system = FakeSystem::new(vec![FakeProcess::new(612, "lsass.exe")]);

    let bare = resolve_target(&system, &ProcessTarget::Name("lsass".into())).unwrap();
    let suffixed = resolve_target(&system, &ProcessTarget::Name("LSASS.EXE".into())).unwrap();
    assert_eq!(bare, suffixed);
    assert_eq!(bare.pid, ProcessId(612));
}

#[test]
fn test_resolve_by_name_picks_oldest()
{
    let system = FakeSystem::new(vec![
        FakeProcess::new(300, "svchost.exe").created(50),
        FakeProcess::new(200, "svchost.exe"),
        FakeProcess::new(400, "svchost.exe").created(10),
    ]);

    let entry = resolve_target(&system, &ProcessTarget::Name("svchost".into())).unwrap();
    assert_eq!(entry.pid, ProcessId(400));
    assert_eq!(entry.created, Some(10));
}

#[test]
fn test_creation_time_read_only_for_ambiguous_names()
{
    let system = FakeSystem::new(vec![
        FakeProcess::new(4, "System").created(1),
        FakeProcess::new(300, "svchost.exe").created(50),
        FakeProcess::new(400, "svchost.exe").created(10),
        FakeProcess::new(500, "notepad.exe").created(70),
    ]);

    list_processes(&system).unwrap();
    resolve_target(&system, &ProcessTarget::Id(ProcessId(300))).unwrap();
    let single = resolve_target(&system, &ProcessTarget::Name("notepad".into())).unwrap();
    assert_eq!(single.pid, ProcessId(500));
    assert!(system.creation_queries.borrow().is_empty());

    resolve_target(&system, &ProcessTarget::Name("svchost".into())).unwrap();
    assert_eq!(*system.creation_queries.borrow(), vec![300, 400]);
}

#[test]
fn test_resolve_by_name_falls_back_to_pid_order()
{
    let system = FakeSystem::new(vec![FakeProcess::new(300, "app.exe"), FakeProcess::new(200, "app.exe")]);

    let entry = resolve_target(&system, &ProcessTarget::Name("app".into())).unwrap();
    assert_eq!(entry.pid, ProcessId(200));
}

#[test]
fn test_resolve_unknown_name()
{
    let system = FakeSystem::new(vec![FakeProcess::new(4, "System")]);

    let err = resolve_target(&system, &ProcessTarget::Name("nope.exe".into())).unwrap_err();
    assert!(matches!(err, SnapError::ProcessNameNotFound(name) if name == "nope.exe"));

    let err = resolve_target(&system, &ProcessTarget::Name(".exe".into())).unwrap_err();
    assert!(matches!(err, SnapError::InvalidArgument(_)));
}
