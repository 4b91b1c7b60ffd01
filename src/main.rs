use itertools::Itertools;

use rolite::pager::Pager;
use rolite::{db_info, formatting, list_tables, run_query, Error, QueryOutput};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <database path> <command>", args[0]);
        return 1;
    }
    let pager = match Pager::open(&args[1]) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return 2;
        }
    };
    let result = match args[2].as_str() {
        ".dbinfo" => dbinfo_command(&pager),
        ".tables" => tables_command(&pager),
        sql => query_command(&pager, sql),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

fn dbinfo_command(pager: &Pager) -> Result<(), Error> {
    let info = db_info(pager)?;
    println!("database page size: {}", info.page_size);
    println!("number of tables: {}", info.num_tables);
    Ok(())
}

fn tables_command(pager: &Pager) -> Result<(), Error> {
    println!("{}", list_tables(pager)?.iter().join(" "));
    Ok(())
}

fn query_command(pager: &Pager, sql: &str) -> Result<(), Error> {
    match run_query(pager, sql)? {
        QueryOutput::Count(n) => println!("{}", n),
        QueryOutput::Rows(rows) => {
            for row in rows {
                println!("{}", formatting::format_row(&row?));
            }
        }
    }
    Ok(())
}
