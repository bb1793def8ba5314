fn main() {
    formdec::run();
}
