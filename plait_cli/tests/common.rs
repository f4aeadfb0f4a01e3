use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn plait_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("plait"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("PLAIT_LOG");
	cmd
}
