fn main() {
  cfg_aliases::cfg_aliases! {
      linux: { target_os = "linux" },
      freebsd: { target_os = "freebsd" },
      apple: { target_vendor = "apple" },
      sendfile: { any(target_os = "linux", target_os = "freebsd", target_vendor = "apple") },
  }
}
