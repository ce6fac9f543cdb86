use std::io;
use std::process::Command;

const INIT: &str = "/sbin/init";
const VCGENCMD: &str = "/opt/vc/bin/vcgencmd";

/// The machine the bot runs on.
pub trait Host {
    fn shutdown(&self) -> io::Result<()>;
    fn restart(&self) -> io::Result<()>;
    fn cpu_temperature(&self) -> io::Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RaspberryPi;

fn run_init(runlevel: &str) -> io::Result<()> {
    let status = Command::new(INIT).arg(runlevel).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} {} exited with {}", INIT, runlevel, status),
        ))
    }
}

/// `temp=48.3'C` becomes `48.3°C`.
pub fn parse_measure_temp(output: &str) -> Option<String> {
    let (_, value) = output.trim().split_once('=')?;
    Some(value.replace('\'', "°"))
}

impl Host for RaspberryPi {
    fn shutdown(&self) -> io::Result<()> {
        run_init("0")
    }

    fn restart(&self) -> io::Result<()> {
        run_init("6")
    }

    fn cpu_temperature(&self) -> io::Result<String> {
        let output = Command::new(VCGENCMD).arg("measure_temp").output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_measure_temp(&stdout).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected vcgencmd output {:?}", stdout),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_temp_output() {
        assert_eq!(
            parse_measure_temp("temp=48.3'C\n"),
            Some("48.3°C".to_string())
        );
        assert_eq!(parse_measure_temp("error"), None);
    }
}
