//! Tests for platform-agnostic types

use memsnap_core::{MachineArchitecture, ProcessEntry, ProcessId, ProcessRecord, ProcessTarget, Table, TabularRecord};

fn record(pid: u32, name: &str) -> ProcessRecord
{
    ProcessRecord {
        pid: ProcessId(pid),
        parent_pid: 4,
        name: name.to_string(),
        executable_path: format!("C:\\Windows\\{name}"),
        session_id: 1,
        owner_account: "NT AUTHORITY\\SYSTEM".to_string(),
        architecture: MachineArchitecture::X64,
    }
}

#[test]
fn test_process_id_conversions()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.raw(), 12345);
    let value: u32 = pid.into();
    assert_eq!(value, 12345);
    assert_ne!(ProcessId(1), ProcessId(2));
}

#[test]
fn test_architecture_display()
{
    assert_eq!(MachineArchitecture::X86.to_string(), "x86");
    assert_eq!(MachineArchitecture::X64.to_string(), "x64");
    assert_eq!(MachineArchitecture::IA64.to_string(), "IA64");
    assert_eq!(MachineArchitecture::from_processor_code(5), MachineArchitecture::Unknown);
}

#[test]
fn test_process_record_columns()
{
    let rec = record(612, "lsass.exe");
    let fields = rec.fields();
    assert_eq!(fields.len(), ProcessRecord::COLUMNS.len());
    assert_eq!(fields[0], ("ProcessName", "lsass.exe".to_string()));
    assert_eq!(fields[1], ("ProcessId", "612".to_string()));
    assert_eq!(fields[2], ("ParentProcessId", "4".to_string()));
    assert_eq!(fields[5], ("Arch", "x64".to_string()));
}

#[test]
fn test_table_keeps_record_order()
{
    let records = vec![record(900, "b.exe"), record(8, "a.exe")];
    let table = Table::from_records(&records);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0][0], "b.exe");
    assert_eq!(table.rows()[1][0], "a.exe");
}

#[test]
fn test_table_render_aligns_columns()
{
    let records = vec![record(4, "System"), record(1200, "explorer.exe")];
    let text = Table::from_records(&records).render();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ProcessName   ProcessId"));
    assert!(lines[1].starts_with("------------  ---------"));
    let pid_column = lines[0].find("ProcessId").unwrap();
    assert_eq!(&lines[2][pid_column..pid_column + 1], "4");
    assert_eq!(&lines[3][pid_column..pid_column + 4], "1200");
}

#[test]
fn test_table_json_uses_declared_column_order()
{
    let records = vec![record(612, "lsass.exe")];
    let json = serde_json::to_string(&Table::from_records(&records)).unwrap();

    assert!(json.starts_with("[{\"ProcessName\":\"lsass.exe\""));
    let positions: Vec<usize> = ProcessRecord::COLUMNS
        .iter()
        .map(|column| json.find(&format!("\"{column}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_empty_table()
{
    let records: Vec<ProcessRecord> = Vec::new();
    let table = Table::from_records(&records);
    assert!(table.is_empty());
    assert_eq!(serde_json::to_string(&table).unwrap(), "[]");
    assert_eq!(table.render().lines().count(), 2);
}

#[test]
fn test_target_display()
{
    assert_eq!(ProcessTarget::Id(ProcessId(4)).to_string(), "pid 4");
    assert_eq!(ProcessTarget::Name("lsass".into()).to_string(), "'lsass'");
    let entry = ProcessEntry::new(612, "lsass.exe");
    assert_eq!(ProcessTarget::Entry(entry).to_string(), "lsass.exe (pid 612)");
}
