//! Plain-text rendering of server records for stdout

use crate::cmdb::models::Server;
use std::io::{self, Write};

pub const LIST_HEADER: &str = "List of CMDB CI Servers:";
pub const UPDATE_SUCCESS: &str = "Server updated successfully.";

pub fn server_line(server: &Server) -> String {
    format!(
        "SysID: {}, Name: {}, Description: {}",
        server.sys_id, server.name, server.short_description
    )
}

pub fn fetched_line(server: &Server) -> String {
    format!("Fetched Server - {}", server_line(server))
}

/// Write the list header followed by one line per server
pub fn write_server_list<W: Write>(out: &mut W, servers: &[Server]) -> io::Result<()> {
    writeln!(out, "{}", LIST_HEADER)?;
    for server in servers {
        writeln!(out, "{}", server_line(server))?;
    }
    Ok(())
}
