#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use panic_halt as _;
use avr_device::atmega328p::Peripherals;
use log::LevelFilter;
use ufmt::uwriteln;

use avr_coop_scheduler::app::Blinker;
use avr_coop_scheduler::config::{HEARTBEAT_MS, LED_PERIOD_MS, MAX_TASKS, UART_BAUD};
use avr_coop_scheduler::drivers::{serial_console, SerialConsole, SerialLogger};
use avr_coop_scheduler::hal::{board::Led, TickTimer, Uart};
use avr_coop_scheduler::rtos::{millis_to_ticks, Quantum, Runner, Scheduler, SimpleTask};

static SCHEDULER: Scheduler<MAX_TASKS> = Scheduler::new();
static LOGGER: SerialLogger = SerialLogger::new(LevelFilter::Info);

#[avr_device::interrupt(atmega328p)]
fn TIMER2_OVF() {
    SCHEDULER.tick();
}

fn heartbeat() -> Quantum {
    let mut console = SerialConsole::new();
    uwriteln!(console, "uptime: {} ticks", SCHEDULER.ticks()).ok();
    Quantum::SleepFor(millis_to_ticks(HEARTBEAT_MS))
}

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();

    serial_console::install(Uart::new(dp.USART0, UART_BAUD));
    // Interrupts are still disabled here
    unsafe { LOGGER.install() };

    SCHEDULER.init();
    let mut timer = TickTimer::new(dp.TC2);
    timer.start();

    let mut blinker = Blinker::new(Led::into_output(), LED_PERIOD_MS);
    let mut heartbeat_task = SimpleTask::new(heartbeat);

    let mut runner = Runner::new(&SCHEDULER);
    for task in [
        runner.spawn_started(&mut blinker, 0),
        runner.spawn_started(&mut heartbeat_task, 0),
    ] {
        if let Err(e) = task {
            log::error!("spawn failed: {}", e);
        }
    }

    let mut console = SerialConsole::new();
    console.write_line("Scheduler running");

    // Idle sleep mode, woken by the next tick
    dp.CPU.smcr.write(|w| unsafe { w.bits(0x01) });
    unsafe { avr_device::interrupt::enable() };

    runner.run(avr_device::asm::sleep)
}
