fn main() {
    mamino_lib::run()
}
