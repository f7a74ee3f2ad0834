fn main() -> std::process::ExitCode {
    vfatcheck::init::run()
}
