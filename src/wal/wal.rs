use crate::models::sheet::{Cell, Table};
use crate::models::user::User;
use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// WAL operation types
///
/// Free-form text fields are hex encoded on disk so they can never collide
/// with the `|` field separator or span lines.
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    AddUser {
        id: String,
        username: String,
        password_hash: String,
    },
    AddSheet {
        name: String,
    },
    RemoveSheet {
        name: String,
    },
    SaveTable {
        table: Table,
    },
    DeleteTable {
        collection_name: String,
    },
}

impl WalOperation {
    pub fn add_user(user: &User) -> Self {
        WalOperation::AddUser {
            id: user.id.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
        }
    }

    fn encode(&self) -> Result<String> {
        let line = match self {
            WalOperation::AddUser {
                id,
                username,
                password_hash,
            } => format!(
                "ADD_USER|{}|{}|{}",
                id,
                hex::encode(username),
                hex::encode(password_hash)
            ),
            WalOperation::AddSheet { name } => format!("ADD_SHEET|{}", hex::encode(name)),
            WalOperation::RemoveSheet { name } => format!("REMOVE_SHEET|{}", hex::encode(name)),
            WalOperation::SaveTable { table } => {
                let cells = serde_json::to_vec(&table.data).context("Failed to encode cells")?;
                format!(
                    "SAVE_TABLE|{}|{}|{}|{}",
                    hex::encode(&table.collection_name),
                    table.rows,
                    table.columns,
                    hex::encode(cells)
                )
            }
            WalOperation::DeleteTable { collection_name } => {
                format!("DELETE_TABLE|{}", hex::encode(collection_name))
            }
        };
        Ok(line)
    }

    fn decode(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"ADD_USER") => {
                if parts.len() != 4 {
                    bail!("Invalid ADD_USER format");
                }
                Ok(WalOperation::AddUser {
                    id: parts[1].to_string(),
                    username: decode_text(parts[2]).context("Invalid username")?,
                    password_hash: decode_text(parts[3]).context("Invalid password hash")?,
                })
            }
            Some(&"ADD_SHEET") => {
                if parts.len() != 2 {
                    bail!("Invalid ADD_SHEET format");
                }
                Ok(WalOperation::AddSheet {
                    name: decode_text(parts[1]).context("Invalid sheet name")?,
                })
            }
            Some(&"REMOVE_SHEET") => {
                if parts.len() != 2 {
                    bail!("Invalid REMOVE_SHEET format");
                }
                Ok(WalOperation::RemoveSheet {
                    name: decode_text(parts[1]).context("Invalid sheet name")?,
                })
            }
            Some(&"SAVE_TABLE") => {
                if parts.len() != 5 {
                    bail!("Invalid SAVE_TABLE format");
                }
                let collection_name = decode_text(parts[1]).context("Invalid collection name")?;
                let rows = parts[2].parse::<u32>().context("Invalid row count")?;
                let columns = parts[3].parse::<u32>().context("Invalid column count")?;
                let cell_bytes = hex::decode(parts[4]).context("Invalid cell hex")?;
                let data: Vec<Cell> =
                    serde_json::from_slice(&cell_bytes).context("Invalid cell payload")?;

                Ok(WalOperation::SaveTable {
                    table: Table::new(collection_name, rows, columns, data),
                })
            }
            Some(&"DELETE_TABLE") => {
                if parts.len() != 2 {
                    bail!("Invalid DELETE_TABLE format");
                }
                Ok(WalOperation::DeleteTable {
                    collection_name: decode_text(parts[1]).context("Invalid collection name")?,
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex")?;
    String::from_utf8(bytes).context("Invalid UTF-8")
}

pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create WAL directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.encode()?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::decode(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}
