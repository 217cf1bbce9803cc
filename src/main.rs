fn main() {
    wheel_dataprep::cli::run();
}
