fn main() {
  cfg_aliases::cfg_aliases! {
      linux: { target_os = "linux" },
      android: { target_os = "android" },
      epoll: { any(linux, android) },
  }
}
