//! Table rendering for command output.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, Table};
use redbox_cloud::vaults::MAX_VAULTS;
use redbox_cloud::{FileRecord, VaultRecord};

fn create_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header);
    table
}

pub fn files_table(files: &[FileRecord]) -> Table {
    let mut table = create_table(vec!["ID", "Name", "Type", "Status", "Created"]);

    for file in files {
        let status = if file.is_encrypted {
            Cell::new("encrypted").fg(Color::Red)
        } else {
            Cell::new("plaintext")
        };
        table.add_row(vec![
            Cell::new(&file.id),
            Cell::new(file.display_name()),
            Cell::new(&file.file_type),
            status,
            Cell::new(&file.created),
        ]);
    }

    table
}

/// One row per slot, empty slots included.
pub fn vaults_table(slots: &[Option<VaultRecord>]) -> Table {
    let mut table = create_table(vec!["Slot", "Name", "ID"]);

    for (i, slot) in slots.iter().enumerate().take(MAX_VAULTS) {
        let (name, id) = match slot {
            Some(vault) => (Cell::new(&vault.name), Cell::new(&vault.id)),
            None => (Cell::new("Empty").fg(Color::DarkGrey), Cell::new("")),
        };
        table.add_row(vec![Cell::new(i + 1), name, id]);
    }

    table
}

pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    match unit {
        0 => format!("{bytes} B"),
        _ => format!("{size:.1} {}", UNITS[unit]),
    }
}
