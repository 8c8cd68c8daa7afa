fn main() {
    viewer::run_explorer_app();
}
