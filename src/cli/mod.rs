mod commands;
mod handlers;

pub use commands::{
    AutoclaveAction, AutoclaveCommand, BatchAction, BatchCommand, Cli, Commands, PayloadArgs,
    RecordStage, StageAction, StageCommand,
};
pub use handlers::{
    handle_autoclave_list, handle_autoclave_record, handle_batch_create, handle_batch_export,
    handle_batch_list, handle_batch_show, handle_duration, handle_import, handle_init,
    handle_record, handle_serve, handle_stage_set,
};
