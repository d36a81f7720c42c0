use aacneo::cli::{
    handle_autoclave_list, handle_autoclave_record, handle_batch_create, handle_batch_export,
    handle_batch_list, handle_batch_show, handle_duration, handle_import, handle_init,
    handle_record, handle_serve, handle_stage_set, AutoclaveAction, BatchAction, Cli, Commands,
    StageAction,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Batch(batch_cmd) => match batch_cmd.action {
            BatchAction::Create { batch, mould, json } => handle_batch_create(batch, mould, json),
            BatchAction::List {
                status,
                stage,
                stage_status,
                json,
            } => handle_batch_list(status, stage, stage_status, json),
            BatchAction::Show { batch, json } => handle_batch_show(batch, json),
            BatchAction::Export { json } => handle_batch_export(json),
        },
        Commands::Record {
            stage,
            batch,
            payload,
            json,
        } => handle_record(stage, batch, payload, json),
        Commands::Autoclave(autoclave_cmd) => match autoclave_cmd.action {
            AutoclaveAction::Record { payload, json } => handle_autoclave_record(payload, json),
            AutoclaveAction::List { batch, json } => handle_autoclave_list(batch, json),
        },
        Commands::Stage(stage_cmd) => match stage_cmd.action {
            StageAction::Set {
                batch,
                stage,
                status,
            } => handle_stage_set(batch, stage, status),
        },
        Commands::Import {
            workbook,
            date,
            json,
        } => handle_import(workbook, date, json),
        Commands::Duration { start, end } => handle_duration(start, end),
        Commands::Serve { host, port } => handle_serve(host, port),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
