use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use sysbridge::core::modules::{
    Cpu, Disks, Memory, ModuleBinding, ModuleCallback, ModuleData, ModuleName, ModuleSet, ModuleUpdate,
    ModulesUpdate, Sensors, SensorsConsumer, TemperatureReading,
};
use sysbridge::{BridgeError, Result};
use tokio::runtime::Handle;

struct FixedSensors;

impl ModuleUpdate for FixedSensors {
    const NAME: ModuleName = ModuleName::Sensors;
    type Output = Sensors;

    fn update_all_data(&mut self) -> Result<Sensors> {
        Ok(Sensors {
            temperatures: vec![TemperatureReading {
                label: "Package id 0".to_string(),
                current_celsius: Some(61.0),
                ..Default::default()
            }],
            hardware: Vec::new(),
        })
    }
}

struct BrokenSensors;

impl ModuleUpdate for BrokenSensors {
    const NAME: ModuleName = ModuleName::Sensors;
    type Output = Sensors;

    fn update_all_data(&mut self) -> Result<Sensors> {
        Err(BridgeError::module_collection("sensor bus unavailable"))
    }
}

struct FixedMemory;

impl ModuleUpdate for FixedMemory {
    const NAME: ModuleName = ModuleName::Memory;
    type Output = Memory;

    fn update_all_data(&mut self) -> Result<Memory> {
        Ok(Memory {
            total_bytes: 4096,
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct CpuFromSensors {
    sensors: Option<Arc<Sensors>>,
}

impl SensorsConsumer for CpuFromSensors {
    fn set_sensors(&mut self, sensors: Option<Arc<Sensors>>) {
        self.sensors = sensors;
    }
}

impl ModuleUpdate for CpuFromSensors {
    const NAME: ModuleName = ModuleName::Cpu;
    type Output = Cpu;

    fn update_all_data(&mut self) -> Result<Cpu> {
        Ok(Cpu {
            temperature_celsius: self
                .sensors
                .as_ref()
                .and_then(|s| s.temperatures.first())
                .and_then(|t| t.current_celsius),
            ..Default::default()
        })
    }
}

/// Blocks until released; counts how many times it started.
struct GatedDisks {
    started: Arc<AtomicUsize>,
    release: Receiver<()>,
}

impl ModuleUpdate for GatedDisks {
    const NAME: ModuleName = ModuleName::Disks;
    type Output = Disks;

    fn update_all_data(&mut self) -> Result<Disks> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _ = self.release.recv_timeout(Duration::from_secs(10));
        Ok(Disks::default())
    }
}

struct FailingDisks;

impl ModuleUpdate for FailingDisks {
    const NAME: ModuleName = ModuleName::Disks;
    type Output = Disks;

    fn update_all_data(&mut self) -> Result<Disks> {
        Err(BridgeError::module_collection("no block devices"))
    }
}

struct PanickingCpu;

impl ModuleUpdate for PanickingCpu {
    const NAME: ModuleName = ModuleName::Cpu;
    type Output = Cpu;

    fn update_all_data(&mut self) -> Result<Cpu> {
        panic!("cpu collector crashed")
    }
}

fn recording() -> (ModuleCallback, Arc<Mutex<Vec<ModuleData>>>) {
    let published = Arc::new(Mutex::new(Vec::new()));
    let sink = published.clone();
    let callback: ModuleCallback = Arc::new(move |data| sink.lock().push(data));
    (callback, published)
}

fn names(published: &Mutex<Vec<ModuleData>>) -> Vec<ModuleName> {
    published.lock().iter().map(|d| d.name()).collect()
}

async fn wait_for(published: &Mutex<Vec<ModuleData>>, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while published.lock().len() < count && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_idle(modules: &ModulesUpdate, name: ModuleName) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while modules.is_running(name) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sensors_published_before_modules() {
    let (callback, published) = recording();
    let set = ModuleSet::new(FixedSensors)
        .register(ModuleBinding::with_sensors(CpuFromSensors::default()))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules.update_data(None).await;
    wait_for(&published, 3).await;

    let published = published.lock();
    assert_eq!(published.len(), 3);
    assert_eq!(published[0].name(), ModuleName::Sensors);

    let cpu = published.iter().find_map(|d| match d {
        ModuleData::Cpu(cpu) => Some(cpu.clone()),
        _ => None,
    });
    assert_eq!(cpu.and_then(|c| c.temperature_celsius), Some(61.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sensor_failure_does_not_block_modules() {
    let (callback, published) = recording();
    let set = ModuleSet::new(BrokenSensors)
        .register(ModuleBinding::with_sensors(CpuFromSensors::default()))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules.update_data(None).await;
    wait_for(&published, 2).await;

    let mut got = names(&published);
    got.sort();
    assert_eq!(got, vec![ModuleName::Cpu, ModuleName::Memory]);

    let cpu = published.lock().iter().find_map(|d| match d {
        ModuleData::Cpu(cpu) => Some(cpu.clone()),
        _ => None,
    });
    assert_eq!(cpu.map(|c| c.temperature_celsius), Some(None));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_subset_selects_registered_modules_only() {
    let (callback, published) = recording();
    let set = ModuleSet::new(FixedSensors)
        .register(ModuleBinding::with_sensors(CpuFromSensors::default()))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules
        .update_data(Some(&[ModuleName::Memory, ModuleName::Gpus]))
        .await;
    wait_for(&published, 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(names(&published), vec![ModuleName::Sensors, ModuleName::Memory]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_subset_selects_all() {
    let (callback, published) = recording();
    let set = ModuleSet::new(FixedSensors)
        .register(ModuleBinding::with_sensors(CpuFromSensors::default()))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules.update_data(Some(&[])).await;
    wait_for(&published, 3).await;

    assert_eq!(published.lock().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_running_module_is_skipped_until_done() {
    let (callback, published) = recording();
    let started = Arc::new(AtomicUsize::new(0));
    let (release_tx, release_rx): (Sender<()>, Receiver<()>) = unbounded();
    let set = ModuleSet::new(FixedSensors).register(ModuleBinding::new(GatedDisks {
        started: started.clone(),
        release: release_rx,
    }));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules.update_data(None).await;
    assert!(modules.is_running(ModuleName::Disks));
    assert_eq!(modules.running(), vec![ModuleName::Disks]);

    // Still blocked: second tick must not launch another task
    modules.update_data(None).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);

    release_tx.send(()).unwrap();
    wait_idle(&modules, ModuleName::Disks).await;
    assert!(!modules.is_running(ModuleName::Disks));

    modules.update_data(None).await;
    release_tx.send(()).unwrap();
    wait_idle(&modules, ModuleName::Disks).await;

    assert_eq!(started.load(Ordering::SeqCst), 2);
    let disks = names(&published)
        .into_iter()
        .filter(|n| *n == ModuleName::Disks)
        .count();
    assert_eq!(disks, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_module_failures_are_isolated() {
    let (callback, published) = recording();
    let set = ModuleSet::new(FixedSensors)
        .register(ModuleBinding::new(PanickingCpu))
        .register(ModuleBinding::new(FailingDisks))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::ZERO, callback);

    modules.update_data(None).await;
    wait_for(&published, 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(names(&published), vec![ModuleName::Sensors, ModuleName::Memory]);

    // The panicking module can be launched again on the next tick
    wait_idle(&modules, ModuleName::Cpu).await;
    assert!(!modules.is_running(ModuleName::Cpu));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_launches_are_staggered() {
    let (callback, _published) = recording();
    let set = ModuleSet::new(FixedSensors)
        .register(ModuleBinding::with_sensors(CpuFromSensors::default()))
        .register(ModuleBinding::new(FixedMemory));
    let modules = ModulesUpdate::new(set, Handle::current(), Duration::from_millis(100), callback);

    assert_eq!(modules.module_names(), vec![ModuleName::Cpu, ModuleName::Memory]);

    let started = Instant::now();
    modules.update_data(None).await;
    assert!(started.elapsed() >= Duration::from_millis(180));
}
