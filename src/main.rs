use crate::shell::start_shell;

mod shell;

fn main() {
    env_logger::init();
    start_shell();
}
